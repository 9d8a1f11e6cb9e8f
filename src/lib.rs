//! agentdesk library - property agency CRUD web application
//!
//! Server-rendered user/client management with nested property/meeting
//! editing, registration, and cookie-session login. Exposed as a library so
//! integration tests can drive the router directly.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod render;

pub use error::{AppError, AppResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Directory for uploaded profile pictures
    pub uploads_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, uploads_dir: PathBuf) -> Self {
        Self {
            db,
            uploads_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Everything is public except /logout, which sits behind the session
/// middleware (callers without a session are redirected to /login).
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    let session_gated = Router::new()
        .route("/logout", get(api::login::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/", get(api::index::index))
        .route(
            "/user/new",
            get(api::users::create_form).post(api::users::create_submit),
        )
        .route(
            "/user/:id",
            get(api::users::detail).post(api::users::detail_submit),
        )
        .route("/user/:id/delete", post(api::users::delete))
        .route(
            "/client/new",
            get(api::clients::create_form).post(api::clients::create_submit),
        )
        .route(
            "/client/:id",
            get(api::clients::detail).post(api::clients::detail_submit),
        )
        .route("/client/:id/delete", post(api::clients::delete))
        .route(
            "/register",
            get(api::register::form).post(api::register::submit),
        )
        .route("/login", get(api::login::form).post(api::login::submit))
        .merge(session_gated)
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
