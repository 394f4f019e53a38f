//! Category reference-data routes. Reads are public, writes are admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::identity::AdminIdentity;
use crate::database::models::category::Category;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::repositories::categories::{self, CategoryPatch};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(categories::list(&state.pool).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id)?;
    categories::get(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

pub async fn create(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Name is required"))?;

    let category = categories::create(&state.pool, name, body.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Path(id): Path<String>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id)?;
    let patch = CategoryPatch {
        name: body.name,
        description: body.description,
    };
    categories::update(&state.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

pub async fn remove(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if categories::delete(&state.pool, id).await? {
        Ok(Json(json!({ "message": "Category deleted" })))
    } else {
        Err(ApiError::not_found("Category not found"))
    }
}
