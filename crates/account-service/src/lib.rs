//! Remote account service for Sapa UMKM
//!
//! A small REST service over SQLite: registration, login and user CRUD.
//! Passwords are stored as bcrypt hashes and never leave the service.
//! The endpoints carry no authentication.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod password;
pub mod repository;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::{Config, ConfigError};
pub use error::{Result, ServiceError};
pub use repository::{SqliteUserRepository, UserRecord, UserRepository};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use storage::{DatabaseConfig, SqliteDatabase};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// All routes with tracing and permissive CORS
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/register", post(routes::register))
        .route("/api/login", post(routes::login))
        .route("/api/users", get(routes::list_users))
        .route(
            "/api/users/:id",
            get(routes::get_user).put(routes::update_user).delete(routes::delete_user),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Open the configured database and build handler state
pub async fn connect(config: &Config) -> anyhow::Result<AppState> {
    let db = SqliteDatabase::connect(DatabaseConfig::new(&config.database_url)).await?;
    let users = SqliteUserRepository::open(db).await?;
    Ok(AppState::new(Arc::new(users), config.bcrypt_cost))
}

/// Serve on `listener` until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured port and serve until Ctrl+C or SIGTERM
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Initializing state...");
    let state = connect(&config).await?;

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server running on {address}");

    run(listener, state, shutdown_signal()).await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
