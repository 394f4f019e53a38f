//! Registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{hash_password, issue_token, verify_password, Claims};
use crate::config;
use crate::database::models::user::{UserView, DEFAULT_ROLE, ROLES};
use crate::error::ApiError;
use crate::handlers::non_blank;
use crate::repositories::users;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = non_blank(body.email.as_deref())
        .ok_or_else(|| ApiError::validation("Email and password are required"))?;
    let password = non_blank(body.password.as_deref())
        .ok_or_else(|| ApiError::validation("Email and password are required"))?;
    let role = match body.role.as_deref() {
        None => DEFAULT_ROLE,
        Some(role) if ROLES.contains(&role) => role,
        Some(other) => {
            return Err(ApiError::validation(format!("Unknown role: {}", other)));
        }
    };

    if users::find_by_email(&state.pool, email).await?.is_some() {
        return Err(ApiError::conflict("Email already in use"));
    }

    let password_hash = hash_password(password, config::config().security.bcrypt_cost)?;
    let user = users::create(&state.pool, email, &password_hash, role).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": UserView::from(user) })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = non_blank(body.email.as_deref())
        .ok_or_else(|| ApiError::validation("Email and password are required"))?;
    let password = non_blank(body.password.as_deref())
        .ok_or_else(|| ApiError::validation("Email and password are required"))?;

    // Unknown email and wrong password fail identically so the response
    // cannot be used to enumerate accounts.
    let user = users::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let security = &config::config().security;
    let claims = Claims::new(user.id, user.role.clone(), security.jwt_expiry_hours);
    let token = issue_token(&claims, &security.jwt_secret).map_err(|e| {
        tracing::error!("Token issuance failed: {}", e);
        ApiError::internal("Failed to issue token")
    })?;

    // Email and role only; the password and token never reach the log
    tracing::info!("Login successful: {} (role: {})", user.email, user.role);

    Ok(Json(json!({ "token": token, "role": user.role })))
}
