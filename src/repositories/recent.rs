//! Bounded recently-viewed task list, kept per user.
//!
//! Max 5 entries, most-recent-first, de-duplicated. Re-viewing a task moves it
//! to the front without growing the list.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::task::{TaskRow, TaskView};
use crate::error::ApiError;
use crate::repositories::tasks::TASK_SELECT;

pub const MAX_RECENT: usize = 5;

/// Remove the task if already present, prepend it, truncate to the cap.
pub fn push_recent(mut list: Vec<Uuid>, task_id: Uuid) -> Vec<Uuid> {
    list.retain(|id| *id != task_id);
    list.insert(0, task_id);
    list.truncate(MAX_RECENT);
    list
}

/// Record a task view for a user.
///
/// Single-row read-modify-write; two simultaneous views by the same user may
/// lose one update, which is acceptable for this list.
pub async fn record_view(pool: &PgPool, user_id: Uuid, task_id: Uuid) -> Result<(), sqlx::Error> {
    let current: Option<(Vec<Uuid>,)> =
        sqlx::query_as("SELECT recently_viewed FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let Some((list,)) = current else {
        return Ok(());
    };

    sqlx::query("UPDATE users SET recently_viewed = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(push_recent(list, task_id))
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve the stored ids to current task records, preserving stored order.
/// Tasks deleted since they were viewed are silently omitted.
pub async fn list_recently_viewed(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskView>, ApiError> {
    let stored: Option<(Vec<Uuid>,)> =
        sqlx::query_as("SELECT recently_viewed FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let Some((ids,)) = stored else {
        return Ok(vec![]);
    };
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!("{} WHERE tasks.id = ANY($1)", TASK_SELECT);
    let rows: Vec<TaskRow> = sqlx::query_as(&sql)
        .bind(ids.clone())
        .fetch_all(pool)
        .await?;

    let mut by_id: HashMap<Uuid, TaskRow> = rows.into_iter().map(|r| (r.id, r)).collect();
    Ok(ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(TaskRow::into_view)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_view_evicts_oldest() {
        let tasks: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        let mut list = Vec::new();
        for id in &tasks {
            list = push_recent(list, *id);
        }
        // Viewing T1..T6 in order leaves [T6, T5, T4, T3, T2]
        assert_eq!(
            list,
            vec![tasks[5], tasks[4], tasks[3], tasks[2], tasks[1]]
        );
    }

    #[test]
    fn re_view_moves_to_front_without_growth() {
        let tasks: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        let mut list = Vec::new();
        for id in &tasks {
            list = push_recent(list, *id);
        }
        // Re-view T4 (tasks[3])
        list = push_recent(list, tasks[3]);
        assert_eq!(
            list,
            vec![tasks[3], tasks[5], tasks[4], tasks[2], tasks[1]]
        );
        assert_eq!(list.len(), MAX_RECENT);
    }

    #[test]
    fn repeat_view_is_idempotent_on_content() {
        let id = Uuid::new_v4();
        let once = push_recent(vec![], id);
        let twice = push_recent(once.clone(), id);
        assert_eq!(once, twice);
    }
}
