//! Development setup: clears all users and creates a known admin account.
//!
//! Credentials default to admin@test.com / 123456 and can be overridden with
//! ADMIN_EMAIL / ADMIN_PASSWORD. Not for production use.

use anyhow::Context;
use taskboard_api::auth::hash_password;
use taskboard_api::repositories::users;
use taskboard_api::{config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@test.com".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "123456".to_string());

    let pool = database::manager::connect()
        .await
        .context("database connection failed")?;

    sqlx::query("DELETE FROM users").execute(&pool).await?;
    tracing::info!("Cleared all users");

    let password_hash = hash_password(&password, config::config().security.bcrypt_cost)?;
    let admin = users::create(&pool, &email, &password_hash, "admin").await?;

    tracing::info!("Admin user created: {} (role: {})", admin.email, admin.role);
    tracing::info!("Setup complete, you can now log in with these credentials");
    Ok(())
}
