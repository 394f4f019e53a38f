//! Task CRUD and the role-based listing algorithm.
//!
//! Listing composes three independent restrictions with AND semantics:
//! the role-derived visibility base filter, an optional status match, and an
//! optional search OR-group over title/assignee. The visibility OR-group and
//! the search OR-group stay in separate AND arms; see `list_filter`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::database::bind_param_as;
use crate::database::models::task::{TaskRow, TaskView, PRIORITIES, STATUSES};
use crate::error::ApiError;
use crate::filter::Expr;

pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Listing join: task plus resolved creator email and category record.
pub const TASK_SELECT: &str = "SELECT tasks.id, tasks.title, tasks.description, \
     tasks.assigned_to, tasks.created_by, tasks.priority, tasks.status, \
     tasks.deadline, tasks.category_id, tasks.created_at, tasks.updated_at, \
     users.email AS created_by_email, \
     categories.name AS category_name, \
     categories.description AS category_description, \
     categories.created_at AS category_created_at, \
     categories.updated_at AS category_updated_at \
     FROM tasks \
     LEFT JOIN users ON users.id = tasks.created_by \
     LEFT JOIN categories ON categories.id = tasks.category_id";

/// One page of tasks plus pagination bookkeeping.
#[derive(Debug)]
pub struct TaskPage {
    pub tasks: Vec<TaskView>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Fields accepted on task creation.
#[derive(Debug)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub priority: String,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
}

/// Partial update payload. There is deliberately no `createdBy` field here:
/// the creator is immutable and a client-supplied value has nowhere to land.
///
/// The nullable columns use a nested option: the outer level distinguishes
/// an absent field from an explicit `null`, which clears the stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, rename = "category", deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(priority) = self.priority.as_deref() {
            validate_priority(priority)?;
        }
        if let Some(status) = self.status.as_deref() {
            validate_status(status)?;
        }
        Ok(())
    }
}

pub fn validate_priority(priority: &str) -> Result<(), ApiError> {
    if PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Priority must be one of: {}",
            PRIORITIES.join(", ")
        )))
    }
}

pub fn validate_status(status: &str) -> Result<(), ApiError> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Status must be one of: {}",
            STATUSES.join(", ")
        )))
    }
}

/// Total page count for a result set: `ceil(total / limit)`.
pub fn page_count(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// Clamp a client-supplied page or limit value to a minimum of 1.
/// Absent means the default; non-numeric or non-positive coerces to 1.
pub fn clamp_index(raw: Option<&str>, default: i64) -> i64 {
    match raw {
        None => default,
        Some(s) => match s.trim().parse::<i64>() {
            Ok(n) if n >= 1 => n,
            _ => 1,
        },
    }
}

/// Role-derived visibility base filter. Admins see everything; everyone else
/// sees tasks assigned to their email or created by them.
fn visibility_filter(identity: &Identity) -> Option<Expr> {
    if identity.is_admin() {
        return None;
    }
    Some(Expr::Or(vec![
        Expr::eq("tasks.assigned_to", identity.email.as_str()),
        Expr::eq("tasks.created_by", identity.user_id),
    ]))
}

/// Full listing filter. Each restriction is its own AND arm, so the search
/// OR-group can never merge into the visibility OR-group.
fn list_filter(identity: &Identity, status: Option<&str>, search: Option<&str>) -> Option<Expr> {
    let mut clauses = Vec::new();
    if let Some(visibility) = visibility_filter(identity) {
        clauses.push(visibility);
    }
    if let Some(status) = status {
        clauses.push(Expr::eq("tasks.status", status));
    }
    if let Some(search) = search {
        clauses.push(Expr::Or(vec![
            Expr::contains("tasks.title", search),
            Expr::contains("tasks.assigned_to", search),
        ]));
    }
    if clauses.is_empty() {
        None
    } else {
        Some(Expr::And(clauses))
    }
}

pub async fn list(
    pool: &PgPool,
    identity: Option<&Identity>,
    status: Option<&str>,
    search: Option<&str>,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<TaskPage, ApiError> {
    let limit_num = clamp_index(limit, DEFAULT_PAGE_SIZE);

    // Unauthenticated callers see nothing
    let Some(identity) = identity else {
        return Ok(TaskPage {
            tasks: vec![],
            page: 1,
            limit: limit_num,
            total: 0,
            pages: 0,
        });
    };

    let page_num = clamp_index(page, 1);
    let status = status.filter(|s| !s.is_empty());
    let search = search.filter(|s| !s.is_empty());

    let (where_sql, params) = match list_filter(identity, status, search) {
        Some(expr) => {
            let rendered = expr.to_sql()?;
            (format!(" WHERE {}", rendered.clause), rendered.params)
        }
        None => (String::new(), vec![]),
    };

    let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for p in &params {
        count_query = bind_param_as(count_query, p);
    }
    let (total,) = count_query.fetch_one(pool).await?;

    let offset = (page_num - 1) * limit_num;
    let list_sql = format!(
        "{}{} ORDER BY tasks.created_at DESC LIMIT {} OFFSET {}",
        TASK_SELECT, where_sql, limit_num, offset
    );
    let mut list_query = sqlx::query_as::<_, TaskRow>(&list_sql);
    for p in &params {
        list_query = bind_param_as(list_query, p);
    }
    let rows = list_query.fetch_all(pool).await?;

    Ok(TaskPage {
        tasks: rows.into_iter().map(TaskRow::into_view).collect(),
        page: page_num,
        limit: limit_num,
        total,
        pages: page_count(total, limit_num),
    })
}

pub async fn get_resolved(pool: &PgPool, id: Uuid) -> Result<Option<TaskView>, sqlx::Error> {
    let sql = format!("{} WHERE tasks.id = $1", TASK_SELECT);
    let row: Option<TaskRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(TaskRow::into_view))
}

pub async fn create(pool: &PgPool, created_by: Uuid, task: NewTask) -> Result<TaskView, ApiError> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO tasks (title, description, assigned_to, created_by, priority, status, deadline, category_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.assigned_to)
    .bind(created_by)
    .bind(&task.priority)
    .bind(&task.status)
    .bind(task.deadline)
    .bind(task.category_id)
    .fetch_one(pool)
    .await?;

    get_resolved(pool, id)
        .await?
        .ok_or_else(|| ApiError::internal("Created task could not be read back"))
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &TaskPatch,
) -> Result<Option<TaskView>, ApiError> {
    let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("UPDATE tasks SET updated_at = now()");
    if let Some(title) = &patch.title {
        qb.push(", title = ").push_bind(title);
    }
    if let Some(description) = &patch.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(assigned_to) = &patch.assigned_to {
        qb.push(", assigned_to = ").push_bind(assigned_to);
    }
    if let Some(priority) = &patch.priority {
        qb.push(", priority = ").push_bind(priority);
    }
    if let Some(status) = &patch.status {
        qb.push(", status = ").push_bind(status);
    }
    // A present-but-null value binds NULL, clearing the column
    if let Some(deadline) = patch.deadline {
        qb.push(", deadline = ").push_bind(deadline);
    }
    if let Some(category_id) = patch.category_id {
        qb.push(", category_id = ").push_bind(category_id);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING id");

    let updated: Option<(Uuid,)> = qb.build_query_as().fetch_optional(pool).await?;
    match updated {
        Some(_) => Ok(get_resolved(pool, id).await?),
        None => Ok(None),
    }
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted: Option<(Uuid,)> = sqlx::query_as("DELETE FROM tasks WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deleted.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "me@example.com".to_string(),
            role: "user".to_string(),
        }
    }

    fn admin_identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "boss@example.com".to_string(),
            role: "admin".to_string(),
        }
    }

    const VISIBILITY_SQL: &str = "((tasks.assigned_to = $1) OR (tasks.created_by = $2))";

    #[test]
    fn clamp_coerces_garbage_to_one() {
        assert_eq!(clamp_index(None, 1), 1);
        assert_eq!(clamp_index(None, DEFAULT_PAGE_SIZE), 5);
        assert_eq!(clamp_index(Some("3"), 1), 3);
        assert_eq!(clamp_index(Some("0"), 1), 1);
        assert_eq!(clamp_index(Some("-7"), 1), 1);
        assert_eq!(clamp_index(Some("abc"), 1), 1);
        assert_eq!(clamp_index(Some(""), 1), 1);
    }

    #[test]
    fn admin_has_no_restriction_without_filters() {
        assert!(list_filter(&admin_identity(), None, None).is_none());
    }

    #[test]
    fn user_visibility_is_assignee_or_creator() {
        let identity = user_identity();
        let sql = list_filter(&identity, None, None)
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(sql.clause, format!("({})", VISIBILITY_SQL));
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn search_nests_inside_visibility_and() {
        let identity = user_identity();
        let sql = list_filter(&identity, Some("pending"), Some("audit"))
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.clause,
            format!(
                "({}) AND (tasks.status = $3) AND \
                 ((tasks.title ILIKE $4) OR (tasks.assigned_to ILIKE $5))",
                VISIBILITY_SQL
            )
        );
    }

    // The visibility base filter must survive every status/search combination
    // for a non-admin caller.
    #[test]
    fn visibility_holds_for_all_filter_combinations() {
        let identity = user_identity();
        let combos: [(Option<&str>, Option<&str>); 4] = [
            (None, None),
            (Some("completed"), None),
            (None, Some("ops")),
            (Some("completed"), Some("ops")),
        ];
        for (status, search) in combos {
            let sql = list_filter(&identity, status, search)
                .unwrap()
                .to_sql()
                .unwrap();
            assert!(
                sql.clause.starts_with(&format!("({})", VISIBILITY_SQL)),
                "visibility group missing for status={:?} search={:?}: {}",
                status,
                search,
                sql.clause
            );
            // Anything added joins with AND at the top level, never OR
            let remainder = &sql.clause[format!("({})", VISIBILITY_SQL).len()..];
            assert!(
                remainder.is_empty() || remainder.starts_with(" AND "),
                "unexpected top-level joiner: {}",
                sql.clause
            );
        }
    }

    #[test]
    fn admin_search_is_unfenced() {
        let sql = list_filter(&admin_identity(), None, Some("ops"))
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.clause,
            "((tasks.title ILIKE $1) OR (tasks.assigned_to ILIKE $2))"
        );
    }

    #[test]
    fn patch_rejects_unknown_enum_values() {
        let patch = TaskPatch {
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = TaskPatch {
            status: Some("done".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = TaskPatch {
            priority: Some("high".to_string()),
            status: Some("in_progress".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(1, 5), 1);
        assert_eq!(page_count(10, 5), 2);
        assert_eq!(page_count(11, 5), 3);
        assert_eq!(page_count(5, 1), 5);
    }

    // The anonymous branch returns before any query, so a lazy pool that
    // never connects is enough to exercise it.
    #[tokio::test]
    async fn anonymous_listing_is_an_empty_page() {
        let pool = PgPool::connect_lazy("postgres://localhost/unreachable").unwrap();

        let page = list(&pool, None, None, None, None, None).await.unwrap();
        assert!(page.tasks.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);

        // The requested limit is still echoed back
        let page = list(&pool, None, None, None, Some("2"), Some("7"))
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 7);
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let patch: TaskPatch = serde_json::from_value(serde_json::json!({
            "deadline": null,
            "category": null,
        }))
        .unwrap();
        assert_eq!(patch.deadline, Some(None));
        assert_eq!(patch.category_id, Some(None));

        let absent: TaskPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(absent.deadline, None);
        assert_eq!(absent.category_id, None);

        let set: TaskPatch = serde_json::from_value(serde_json::json!({
            "deadline": "2026-09-01T12:00:00Z",
        }))
        .unwrap();
        assert!(matches!(set.deadline, Some(Some(_))));
    }

    #[test]
    fn patch_has_no_created_by_channel() {
        // A client trying to reassign ownership gets silently ignored
        let patch: TaskPatch = serde_json::from_value(serde_json::json!({
            "title": "renamed",
            "createdBy": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(patch.title.as_deref(), Some("renamed"));
    }
}
