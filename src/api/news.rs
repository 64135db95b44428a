//! News collection. Drafts are only visible to admins.

use crate::db::{Filter, NewsArticle, NewsArticleInput};

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    check, validate_optional, validate_optional_link, validate_required, validate_timestamp,
};

impl Resource for NewsArticle {
    const LABEL: &'static str = "Article";

    fn validate(input: &NewsArticleInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "title", validate_required(&input.title, "Title", 200));
        check(&mut errors, "excerpt", validate_optional(&input.excerpt, "Excerpt", 500));
        check(&mut errors, "content", validate_required(&input.content, "Content", 100_000));
        check(&mut errors, "image_url", validate_optional_link(&input.image_url));
        check(&mut errors, "author", validate_optional(&input.author, "Author", 100));

        check(&mut errors, "published_at", validate_timestamp(&input.published_at));

        if input.tags.len() > 20 || input.tags.iter().any(|t| t.trim().is_empty() || t.len() > 50) {
            errors.add("tags", "Up to 20 tags of 1-50 characters");
        }

        errors.finish()
    }

    fn public_filter() -> Option<Filter> {
        Some(Filter::bool("published", true))
    }
}
