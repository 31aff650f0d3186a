//! services/api/src/web/auth.rs
//!
//! Faculty login and the password hashing shared with the faculty handlers.

use crate::error::{HttpError, HttpResult};
use crate::web::payload::json_body;
use crate::web::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use portal_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginUser {
    pub username: String,
    pub role: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub status: String,
    pub message: String,
    pub user: LoginUser,
}

//=========================================================================================
// Password Hashing
//=========================================================================================

pub fn hash_password(password: &str) -> HttpResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HttpError::internal("Failed to hash password", e))
}

fn verify_password(password: &str, stored_hash: &str) -> HttpResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Check a faculty member's credentials
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> HttpResult<Json<LoginResponse>> {
    let req = json_body(body)?;
    let (username, password) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u.trim().to_string(), p),
        _ => return Err(HttpError::bad_request("Missing username or password")),
    };

    let invalid = || HttpError::new(StatusCode::UNAUTHORIZED, "Invalid credentials");
    let credentials = match state.db.get_faculty_credentials(&username).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            warn!("Login attempt for unknown faculty {}", username);
            return Err(invalid());
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&password, &credentials.password_hash)? {
        warn!("Invalid password for faculty {}", username);
        return Err(invalid());
    }

    info!("Faculty {} logged in", credentials.faculty_id);
    Ok(Json(LoginResponse {
        status: "success".to_string(),
        message: "Login successful".to_string(),
        user: LoginUser {
            username: credentials.faculty_id,
            role: "faculty".to_string(),
            name: credentials.name,
        },
    }))
}
