//! agentdesk - property agency CRUD web application
//!
//! Server-rendered user/client management with nested property/meeting
//! editing, registration, and cookie-session login.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use agentdesk::config::{Args, Config};
use agentdesk::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting agentdesk v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = Config::resolve(&args);
    config.ensure_directories()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool, config.uploads_dir());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("agentdesk listening on http://{}", config.listen);
    info!("Health check: http://{}/health", config.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
