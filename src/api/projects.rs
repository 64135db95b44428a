//! Fundraising projects and the donate page summary.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{FundingSummary, Project, ProjectInput, PROJECT_STATUSES};
use crate::AppState;

use super::content::Resource;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check, validate_choice, validate_optional_link, validate_required};

/// Validate a monetary amount
fn validate_amount(amount: f64, label: &str) -> Result<(), String> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("{label} must be a non-negative number"));
    }

    Ok(())
}

impl Resource for Project {
    const LABEL: &'static str = "Project";

    fn validate(input: &ProjectInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrorBuilder::new();

        check(&mut errors, "title", validate_required(&input.title, "Title", 200));
        if input.description.chars().count() > 20_000 {
            errors.add("description", "Description is too long (max 20000 characters)");
        }
        check(&mut errors, "image_url", validate_optional_link(&input.image_url));
        check(&mut errors, "status", validate_choice(&input.status, PROJECT_STATUSES));
        check(&mut errors, "goal_amount", validate_amount(input.goal_amount, "Goal"));
        check(&mut errors, "raised_amount", validate_amount(input.raised_amount, "Raised amount"));

        errors.finish()
    }
}

/// Funding totals across all projects
///
/// GET /api/projects/summary
pub async fn funding_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FundingSummary>, ApiError> {
    let projects = state.store.list::<Project>(None).await?;
    Ok(Json(FundingSummary::from_projects(&projects)))
}
