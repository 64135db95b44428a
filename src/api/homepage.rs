//! Homepage hero slides and testimonials.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{
    Filter, HeroSlide, HeroSlideInput, HomepageContent, Testimonial, TestimonialInput,
};
use crate::AppState;

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    check, validate_link, validate_optional, validate_optional_link, validate_required,
};

impl Resource for HeroSlide {
    const LABEL: &'static str = "Slide";

    fn validate(input: &HeroSlideInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "title", validate_required(&input.title, "Title", 200));
        check(&mut errors, "subtitle", validate_optional(&input.subtitle, "Subtitle", 500));
        check(&mut errors, "image_url", validate_required(&input.image_url, "Image", 2048));
        if !input.image_url.trim().is_empty() {
            check(&mut errors, "image_url", validate_link(&input.image_url));
        }
        check(&mut errors, "cta_text", validate_optional(&input.cta_text, "Button text", 50));
        check(&mut errors, "cta_link", validate_optional_link(&input.cta_link));

        errors.finish()
    }

    fn public_filter() -> Option<Filter> {
        Some(Filter::bool("active", true))
    }
}

impl Resource for Testimonial {
    const LABEL: &'static str = "Testimonial";

    fn validate(input: &TestimonialInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "name", validate_required(&input.name, "Name", 100));
        check(&mut errors, "role", validate_optional(&input.role, "Role", 100));
        check(&mut errors, "quote", validate_required(&input.quote, "Quote", 2000));
        check(&mut errors, "image_url", validate_optional_link(&input.image_url));

        errors.finish()
    }

    fn public_filter() -> Option<Filter> {
        Some(Filter::bool("active", true))
    }
}

/// Active slides and testimonials in one response, as the home page renders them.
/// Admins manage inactive items through the collection endpoints.
///
/// GET /api/homepage
pub async fn homepage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HomepageContent>, ApiError> {
    let slides = state.store.list::<HeroSlide>(HeroSlide::public_filter()).await?;
    let testimonials = state
        .store
        .list::<Testimonial>(Testimonial::public_filter())
        .await?;

    Ok(Json(HomepageContent {
        slides,
        testimonials,
    }))
}
