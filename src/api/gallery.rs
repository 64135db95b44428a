//! Gallery collection plus the per-mission photo listing.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{Filter, GalleryItem, GalleryItemInput};
use crate::AppState;

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check, parse_id, validate_link, validate_optional, validate_required};

impl Resource for GalleryItem {
    const LABEL: &'static str = "Gallery item";

    fn validate(input: &GalleryItemInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "title", validate_required(&input.title, "Title", 200));
        check(
            &mut errors,
            "description",
            validate_optional(&input.description, "Description", 2000),
        );
        check(&mut errors, "image_url", validate_required(&input.image_url, "Image", 2048));
        if !input.image_url.trim().is_empty() {
            check(&mut errors, "image_url", validate_link(&input.image_url));
        }
        check(&mut errors, "category", validate_optional(&input.category, "Category", 100));

        if matches!(input.mission_id, Some(id) if id <= 0) {
            errors.add("mission_id", "mission_id must be a positive integer");
        }

        errors.finish()
    }
}

/// Photos taken on one mission
///
/// GET /api/gallery/mission/:missionId
pub async fn list_by_mission(
    State(state): State<Arc<AppState>>,
    Path(mission_id): Path<String>,
) -> Result<Json<Vec<GalleryItem>>, ApiError> {
    let mission_id = parse_id(&mission_id, "missionId")?;

    let items = state
        .store
        .list::<GalleryItem>(Some(Filter::int("mission_id", mission_id)))
        .await?;

    Ok(Json(items))
}
