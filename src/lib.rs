pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod repositories;

use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Auth (public)
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // Tasks: reads take an optional identity, writes are admin-only
        .route(
            "/api/tasks",
            get(handlers::tasks::list).post(handlers::tasks::create),
        )
        .route(
            "/api/tasks/recently-viewed/list",
            get(handlers::tasks::recently_viewed),
        )
        .route(
            "/api/tasks/:id",
            get(handlers::tasks::show)
                .put(handlers::tasks::update)
                .delete(handlers::tasks::remove),
        )
        // Categories: public reads, admin writes
        .route(
            "/api/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/api/categories/:id",
            get(handlers::categories::show)
                .put(handlers::categories::update)
                .delete(handlers::categories::remove),
        )
        // Users (admin)
        .route("/api/users", get(handlers::users::list))
        // Reports
        .route(
            "/api/reports",
            get(handlers::reports::list).post(handlers::reports::create),
        )
        .route("/api/reports/:id", delete(handlers::reports::remove))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
