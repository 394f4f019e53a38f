//! Task routes: listing with role-based visibility, detail with view
//! tracking, the recently-viewed list, and admin-only writes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::identity::{AdminIdentity, Identity, MaybeIdentity};
use crate::database::models::task::{TaskView, DEFAULT_STATUS};
use crate::error::ApiError;
use crate::handlers::{non_blank, parse_id};
use crate::repositories::tasks::{self, NewTask, TaskPatch};
use crate::repositories::recent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    // Kept as raw strings so garbage input clamps instead of rejecting
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = tasks::list(
        &state.pool,
        identity.as_ref(),
        query.status.as_deref(),
        query.search.as_deref(),
        query.page.as_deref(),
        query.limit.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "tasks": page.tasks,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "pages": page.pages,
        }
    })))
}

pub async fn show(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<String>,
) -> Result<Json<TaskView>, ApiError> {
    let id = parse_id(&id)?;
    let task = tasks::get_resolved(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    // Any authenticated viewer gets the view recorded, regardless of role
    if let Some(identity) = identity {
        recent::record_view(&state.pool, identity.user_id, task.id).await?;
    }

    Ok(Json(task))
}

pub async fn recently_viewed(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let tasks = recent::list_recently_viewed(&state.pool, identity.user_id).await?;
    Ok(Json(tasks))
}

pub async fn create(
    State(state): State<AppState>,
    AdminIdentity(identity): AdminIdentity,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let title = non_blank(body.title.as_deref())
        .ok_or_else(|| ApiError::validation("Title is required"))?;
    let description = non_blank(body.description.as_deref())
        .ok_or_else(|| ApiError::validation("Description is required"))?;
    let assigned_to = non_blank(body.assigned_to.as_deref())
        .ok_or_else(|| ApiError::validation("assignedTo is required"))?;
    let priority = body
        .priority
        .as_deref()
        .ok_or_else(|| ApiError::validation("Priority is required"))?;
    tasks::validate_priority(priority)?;
    let status = body.status.as_deref().unwrap_or(DEFAULT_STATUS);
    tasks::validate_status(status)?;

    let task = tasks::create(
        &state.pool,
        identity.user_id,
        NewTask {
            title: title.to_string(),
            description: description.to_string(),
            assigned_to: assigned_to.to_string(),
            priority: priority.to_string(),
            status: status.to_string(),
            deadline: body.deadline,
            category_id: body.category,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskView>, ApiError> {
    let id = parse_id(&id)?;
    patch.validate()?;

    tasks::update(&state.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

pub async fn remove(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if tasks::delete(&state.pool, id).await? {
        Ok(Json(json!({ "message": "Task deleted" })))
    } else {
        Err(ApiError::not_found("Task not found"))
    }
}
