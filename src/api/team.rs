//! Team member collection.

use crate::db::{TeamMember, TeamMemberInput};

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check, validate_optional, validate_optional_link, validate_required};

impl Resource for TeamMember {
    const LABEL: &'static str = "Team member";

    fn validate(input: &TeamMemberInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "name", validate_required(&input.name, "Name", 100));
        check(&mut errors, "role", validate_required(&input.role, "Role", 100));
        check(&mut errors, "bio", validate_optional(&input.bio, "Bio", 5000));
        check(&mut errors, "image_url", validate_optional_link(&input.image_url));

        errors.finish()
    }
}
