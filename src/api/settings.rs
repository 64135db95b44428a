//! Site-wide settings: a flat map of keys to JSON values.

use axum::{extract::State, Json};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::AppState;

use super::auth::Admin;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check, validate_setting_key};

const MAX_KEYS_PER_REQUEST: usize = 100;

/// Largest serialized size of a single value
const MAX_VALUE_BYTES: usize = 64 * 1024;

fn validate_settings(values: &BTreeMap<String, Value>) -> Result<(), ApiError> {
    if values.is_empty() {
        return Err(ApiError::bad_request("No settings provided"));
    }

    if values.len() > MAX_KEYS_PER_REQUEST {
        return Err(ApiError::bad_request(format!(
            "Too many settings in one request (max {MAX_KEYS_PER_REQUEST})"
        )));
    }

    let mut errors = ValidationErrorBuilder::new();
    for (key, value) in values {
        check(&mut errors, key, validate_setting_key(key));
        if value.to_string().len() > MAX_VALUE_BYTES {
            errors.add(key.as_str(), "Value is too large");
        }
    }
    errors.finish()
}

/// All settings
///
/// GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    Ok(Json(state.store.settings().await?))
}

/// Upsert the given keys; keys not in the body are left alone.
/// Returns the full settings map after the update.
///
/// POST /api/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Json(values): Json<BTreeMap<String, Value>>,
) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    validate_settings(&values)?;

    let keys: Vec<String> = values.keys().cloned().collect();
    state.store.save_settings(values).await?;
    info!(keys = ?keys, "Settings updated");

    Ok(Json(state.store.settings().await?))
}
