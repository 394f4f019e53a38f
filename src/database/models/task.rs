use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::category::Category;
use super::user::UserRef;

pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];
pub const STATUSES: [&str; 3] = ["pending", "in_progress", "completed"];
pub const DEFAULT_STATUS: &str = "pending";

/// Flat row produced by the task listing join against users and categories.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: Uuid,
    pub priority: String,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Joined columns; null when the weak reference dangles
    pub created_by_email: Option<String>,
    pub category_name: Option<String>,
    pub category_description: Option<String>,
    pub category_created_at: Option<DateTime<Utc>>,
    pub category_updated_at: Option<DateTime<Utc>>,
}

/// API shape of a task with `createdBy` and `category` resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: Option<UserRef>,
    pub priority: String,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved task reference embedded in report views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
}

impl TaskRow {
    pub fn into_view(self) -> TaskView {
        let category = match (
            self.category_id,
            self.category_name,
            self.category_created_at,
            self.category_updated_at,
        ) {
            (Some(id), Some(name), Some(created_at), Some(updated_at)) => Some(Category {
                id,
                name,
                description: self.category_description,
                created_at,
                updated_at,
            }),
            // Unset or dangling category reference resolves to nothing
            _ => None,
        };

        let created_by = self.created_by_email.map(|email| UserRef {
            id: self.created_by,
            email,
        });

        TaskView {
            id: self.id,
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            created_by,
            priority: self.priority,
            status: self.status,
            deadline: self.deadline,
            category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::new_v4(),
            title: "Ship it".to_string(),
            description: "Release".to_string(),
            assigned_to: "dev@example.com".to_string(),
            created_by: Uuid::new_v4(),
            priority: "high".to_string(),
            status: "pending".to_string(),
            deadline: None,
            category_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
            created_by_email: Some("admin@example.com".to_string()),
            category_name: Some("Ops".to_string()),
            category_description: None,
            category_created_at: Some(now),
            category_updated_at: Some(now),
        }
    }

    #[test]
    fn view_resolves_references() {
        let view = row().into_view();
        assert_eq!(view.created_by.unwrap().email, "admin@example.com");
        assert_eq!(view.category.unwrap().name, "Ops");
    }

    #[test]
    fn dangling_category_resolves_to_none() {
        let mut dangling = row();
        dangling.category_name = None;
        dangling.category_created_at = None;
        dangling.category_updated_at = None;
        let view = dangling.into_view();
        assert!(view.category.is_none());
    }

    #[test]
    fn view_serializes_camel_case() {
        let json = serde_json::to_value(row().into_view()).unwrap();
        assert!(json.get("assignedTo").is_some());
        assert!(json.get("createdBy").is_some());
        assert!(json.get("assigned_to").is_none());
    }
}
