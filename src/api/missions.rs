//! Mission validation for the missions collection.

use crate::db::{Mission, MissionInput, MISSION_STATUSES};

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    check, validate_choice, validate_date, validate_optional, validate_optional_link,
    validate_required,
};

const MAX_HIGHLIGHTS: usize = 20;

/// Start and end dates must not be reversed
fn validate_date_range(start: &Option<String>, end: &Option<String>) -> Result<(), String> {
    match (start.as_deref(), end.as_deref()) {
        // ISO dates compare correctly as strings
        (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() && e < s => {
            Err("End date must not be before the start date".to_string())
        }
        _ => Ok(()),
    }
}

fn validate_highlights(highlights: &[String]) -> Result<(), String> {
    if highlights.len() > MAX_HIGHLIGHTS {
        return Err(format!("At most {MAX_HIGHLIGHTS} highlights are allowed"));
    }

    if highlights.iter().any(|h| h.trim().is_empty() || h.chars().count() > 200) {
        return Err("Highlights must be 1-200 characters".to_string());
    }

    Ok(())
}

impl Resource for Mission {
    const LABEL: &'static str = "Mission";

    fn validate(input: &MissionInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "title", validate_required(&input.title, "Title", 200));
        check(&mut errors, "location", validate_required(&input.location, "Location", 200));
        check(&mut errors, "country", validate_optional(&input.country, "Country", 100));
        if input.description.chars().count() > 20_000 {
            errors.add("description", "Description is too long (max 20000 characters)");
        }
        check(&mut errors, "image_url", validate_optional_link(&input.image_url));
        check(&mut errors, "status", validate_choice(&input.status, MISSION_STATUSES));
        check(&mut errors, "start_date", validate_date(&input.start_date));
        check(&mut errors, "end_date", validate_date(&input.end_date));
        check(
            &mut errors,
            "end_date",
            validate_date_range(&input.start_date, &input.end_date),
        );

        if input.animals_treated < 0 {
            errors.add("animals_treated", "Must not be negative");
        }
        if input.volunteers < 0 {
            errors.add("volunteers", "Must not be negative");
        }

        check(&mut errors, "highlights", validate_highlights(&input.highlights));

        errors.finish()
    }
}
