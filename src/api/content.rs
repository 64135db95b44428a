//! CRUD handlers shared by every content collection.
//!
//! Each collection implements [`Resource`] and is routed through the generic
//! handlers below, e.g. `get(list_items::<Mission>)`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::db::{Entity, Filter};
use crate::AppState;

use super::auth::{Admin, MaybeAdmin};
use super::error::ApiError;
use super::validation::parse_id;

/// A content collection exposed over the API
pub trait Resource: Entity {
    /// Human readable name used in messages and logs
    const LABEL: &'static str;

    fn validate(input: &Self::Input) -> Result<(), ApiError>;

    /// Restriction applied for anonymous callers. Admins always see everything.
    fn public_filter() -> Option<Filter> {
        None
    }
}

/// Filter to apply for the given caller
fn visibility_filter<T: Resource>(viewer: &MaybeAdmin) -> Option<Filter> {
    if viewer.is_admin() {
        None
    } else {
        T::public_filter()
    }
}

/// Whether an anonymous caller may see `item`
fn is_public<T: Resource>(item: &T) -> bool {
    match T::public_filter() {
        Some(filter) => serde_json::to_value(item)
            .map(|value| filter.matches(&value))
            .unwrap_or(false),
        None => true,
    }
}

fn not_found<T: Resource>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::LABEL))
}

/// GET /api/{collection}
pub async fn list_items<T: Resource>(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAdmin,
) -> Result<Json<Vec<T>>, ApiError> {
    let items = state.store.list::<T>(visibility_filter::<T>(&viewer)).await?;
    Ok(Json(items))
}

/// GET /api/{collection}/:id
pub async fn get_item<T: Resource>(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAdmin,
    Path(id): Path<String>,
) -> Result<Json<T>, ApiError> {
    let id = parse_id(&id, "id")?;

    let item = state
        .store
        .get::<T>(id)
        .await?
        .ok_or_else(not_found::<T>)?;

    // Hidden items look exactly like missing ones to the public
    if !viewer.is_admin() && !is_public(&item) {
        return Err(not_found::<T>());
    }

    Ok(Json(item))
}

/// POST /api/{collection}
pub async fn create_item<T: Resource>(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Json(input): Json<T::Input>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    T::validate(&input)?;

    let item = state.store.create::<T>(input).await?;
    info!(id = item.id(), table = T::TABLE, "{} created", T::LABEL);

    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/{collection}/:id
///
/// Replaces every editable field; omitted optional fields are cleared.
pub async fn update_item<T: Resource>(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(input): Json<T::Input>,
) -> Result<Json<T>, ApiError> {
    let id = parse_id(&id, "id")?;
    T::validate(&input)?;

    let item = state
        .store
        .update::<T>(id, input)
        .await?
        .ok_or_else(not_found::<T>)?;
    info!(id = item.id(), table = T::TABLE, "{} updated", T::LABEL);

    Ok(Json(item))
}

/// DELETE /api/{collection}/:id
pub async fn delete_item<T: Resource>(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "id")?;

    if !state.store.delete::<T>(id).await? {
        return Err(not_found::<T>());
    }
    info!(id, table = T::TABLE, "{} deleted", T::LABEL);

    Ok(StatusCode::NO_CONTENT)
}
