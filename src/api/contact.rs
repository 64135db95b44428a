//! Public contact form.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::notifications::ContactMessage;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check, validate_email, validate_optional, validate_required};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub sent: bool,
}

fn validate_message(message: &ContactMessage) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    check(&mut errors, "name", validate_required(&message.name, "Name", 100));
    check(&mut errors, "email", validate_email(message.email.trim()));
    check(&mut errors, "phone", validate_optional(&message.phone, "Phone", 40));
    check(&mut errors, "subject", validate_optional(&message.subject, "Subject", 200));
    check(&mut errors, "message", validate_required(&message.message, "Message", 5000));

    errors.finish()
}

/// Forward a contact form submission to the site's inbox
///
/// POST /api/contact
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<ContactResponse>, ApiError> {
    validate_message(&message)?;

    let recipient = match state.config.email.contact_recipient.as_deref() {
        Some(recipient) if state.mailer.is_enabled() => recipient,
        _ => {
            warn!("Contact form submitted but email delivery is not configured");
            return Err(ApiError::service_unavailable(
                "The contact form is currently unavailable",
            ));
        }
    };

    state
        .mailer
        .send(message.to_email(recipient))
        .await
        .map_err(|e| {
            tracing::error!("Failed to deliver contact message: {}", e);
            ApiError::external("Failed to send your message, please try again later")
        })?;

    info!(from = %message.email.trim(), "Contact message forwarded");

    Ok(Json(ContactResponse { sent: true }))
}
