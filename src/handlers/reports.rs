//! Report routes. Any authenticated user may file and list reports;
//! non-admins only ever see their own, and only admins may delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::identity::{AdminIdentity, Identity};
use crate::database::models::report::{ReportView, REPORT_CATEGORIES};
use crate::error::ApiError;
use crate::handlers::{non_blank, parse_id};
use crate::repositories::reports::{self, NewReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub related_task: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    Ok(Json(reports::list(&state.pool, &identity).await?))
}

pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportView>), ApiError> {
    let missing = || ApiError::validation("Title, description, and category are required");
    let title = non_blank(body.title.as_deref()).ok_or_else(missing)?;
    let description = non_blank(body.description.as_deref()).ok_or_else(missing)?;
    let category = non_blank(body.category.as_deref()).ok_or_else(missing)?;
    if !REPORT_CATEGORIES.contains(&category) {
        return Err(ApiError::validation(format!(
            "Category must be one of: {}",
            REPORT_CATEGORIES.join(", ")
        )));
    }

    // createdBy comes from the verified identity, never from the payload
    let report = reports::create(
        &state.pool,
        identity.user_id,
        NewReport {
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            related_task: body.related_task,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn remove(
    State(state): State<AppState>,
    _identity: AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if reports::delete(&state.pool, id).await? {
        Ok(Json(json!({ "message": "Report deleted successfully" })))
    } else {
        Err(ApiError::not_found("Report not found"))
    }
}
