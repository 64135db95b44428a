//! Admin authentication.
//!
//! There is a single admin identity, unlocked by the shared admin password.
//! A successful login returns an HS256 JWT which the dashboard sends back as
//! `Authorization: Bearer <token>`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::AppState;

use super::error::ApiError;

const ADMIN_SUBJECT: &str = "admin";

/// JWT claims embedded in every admin token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// Expiration time (UTC Unix timestamp)
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp)
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub role: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Check a login attempt against the configured admin credentials.
///
/// An argon2 hash takes precedence over a plain password. With neither
/// configured, every attempt fails.
pub fn check_admin_password(config: &AuthConfig, candidate: &str) -> bool {
    if let Some(hash) = config.admin_password_hash.as_deref().filter(|h| !h.is_empty()) {
        return verify_password(candidate, hash);
    }

    match config.admin_password.as_deref().filter(|p| !p.is_empty()) {
        // Only compare if lengths match (constant-time check)
        Some(expected) => {
            expected.len() == candidate.len()
                && expected.as_bytes().ct_eq(candidate.as_bytes()).into()
        }
        None => false,
    }
}

/// Issue a signed admin token
pub fn issue_token(config: &AuthConfig) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        role: "admin".to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok((token, claims))
}

/// Validate signature and expiry, returning the claims
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(data.claims)
}

/// Extract the bearer token from request headers
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Login endpoint
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !check_admin_password(&state.config.auth, &request.password) {
        warn!("Failed admin login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let (token, claims) = issue_token(&state.config.auth).map_err(|e| {
        tracing::error!("Failed to sign admin token: {}", e);
        ApiError::internal("Failed to create session")
    })?;
    let expires_at = claims
        .expires_at()
        .ok_or_else(|| ApiError::internal("Failed to create session"))?;

    info!(jti = %claims.jti, "Admin logged in");

    Ok(Json(LoginResponse { token, expires_at }))
}

/// Describe the current session
///
/// GET /api/auth/me
pub async fn me(Admin(claims): Admin) -> Json<MeResponse> {
    Json(MeResponse {
        expires_at: claims.expires_at(),
        role: claims.role,
    })
}

/// Extractor that rejects requests without a valid admin token
pub struct Admin(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        verify_token(token, &state.config.auth)
            .map(Admin)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))
    }
}

/// Extractor for public endpoints that show more to admins.
///
/// Never rejects: a missing or invalid token simply means "not an admin".
pub struct MaybeAdmin(pub Option<Claims>);

impl MaybeAdmin {
    pub fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts).and_then(|t| verify_token(t, &state.config.auth).ok());
        Ok(MaybeAdmin(claims))
    }
}
