use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::task::TaskRef;
use super::user::UserRef;

pub const REPORT_CATEGORIES: [&str; 2] = ["work", "complaint"];

/// Flat row produced by the report listing join.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: Uuid,
    pub related_task: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_email: Option<String>,
    pub related_task_title: Option<String>,
}

/// API shape of a report with creator and related task resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: Option<UserRef>,
    pub related_task: Option<TaskRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportRow {
    pub fn into_view(self) -> ReportView {
        let related_task = match (self.related_task, self.related_task_title) {
            (Some(id), Some(title)) => Some(TaskRef { id, title }),
            _ => None,
        };
        ReportView {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            created_by: self.created_by_email.map(|email| UserRef {
                id: self.created_by,
                email,
            }),
            related_task,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
