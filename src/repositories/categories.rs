use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::models::category::Category;
use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &CategoryPatch,
) -> Result<Option<Category>, ApiError> {
    let mut qb: QueryBuilder<sqlx::Postgres> =
        QueryBuilder::new("UPDATE categories SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(description) = &patch.description {
        qb.push(", description = ").push_bind(description);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING *");

    Ok(qb
        .build_query_as::<Category>()
        .fetch_optional(pool)
        .await?)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted: Option<(Uuid,)> =
        sqlx::query_as("DELETE FROM categories WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(deleted.is_some())
}
