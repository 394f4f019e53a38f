use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::user::{User, UserView};
use crate::error::ApiError;

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Email lookup is exact and case-sensitive, matching how addresses are stored.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<User, ApiError> {
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        // Covers the race where two registrations pass the pre-check together
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(ApiError::conflict("Email already in use"))
        }
        Err(other) => Err(other.into()),
    }
}

/// All users with credential material excluded.
pub async fn list(pool: &PgPool) -> Result<Vec<UserView>, sqlx::Error> {
    sqlx::query_as::<_, UserView>(
        "SELECT id, email, role, recently_viewed, created_at, updated_at \
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}
