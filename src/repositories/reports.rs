use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::database::bind_param_as;
use crate::database::models::report::{ReportRow, ReportView};
use crate::error::ApiError;
use crate::filter::Expr;

const REPORT_SELECT: &str = "SELECT reports.id, reports.title, reports.description, \
     reports.category, reports.created_by, reports.related_task, \
     reports.created_at, reports.updated_at, \
     users.email AS created_by_email, \
     tasks.title AS related_task_title \
     FROM reports \
     LEFT JOIN users ON users.id = reports.created_by \
     LEFT JOIN tasks ON tasks.id = reports.related_task";

#[derive(Debug)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category: String,
    pub related_task: Option<Uuid>,
}

/// Admins see every report; everyone else only their own. Newest first.
pub async fn list(pool: &PgPool, identity: &Identity) -> Result<Vec<ReportView>, ApiError> {
    let scope = if identity.is_admin() {
        None
    } else {
        Some(Expr::eq("reports.created_by", identity.user_id))
    };

    let (where_sql, params) = match scope {
        Some(expr) => {
            let rendered = expr.to_sql()?;
            (format!(" WHERE {}", rendered.clause), rendered.params)
        }
        None => (String::new(), vec![]),
    };

    let sql = format!(
        "{}{} ORDER BY reports.created_at DESC",
        REPORT_SELECT, where_sql
    );
    let mut query = sqlx::query_as::<_, ReportRow>(&sql);
    for p in &params {
        query = bind_param_as(query, p);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(ReportRow::into_view).collect())
}

pub async fn create(
    pool: &PgPool,
    created_by: Uuid,
    report: NewReport,
) -> Result<ReportView, ApiError> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO reports (title, description, category, created_by, related_task) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&report.title)
    .bind(&report.description)
    .bind(&report.category)
    .bind(created_by)
    .bind(report.related_task)
    .fetch_one(pool)
    .await?;

    get_resolved(pool, id)
        .await?
        .ok_or_else(|| ApiError::internal("Created report could not be read back"))
}

pub async fn get_resolved(pool: &PgPool, id: Uuid) -> Result<Option<ReportView>, sqlx::Error> {
    let sql = format!("{} WHERE reports.id = $1", REPORT_SELECT);
    let row: Option<ReportRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(ReportRow::into_view))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted: Option<(Uuid,)> =
        sqlx::query_as("DELETE FROM reports WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(deleted.is_some())
}
