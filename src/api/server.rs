//! HTTP API server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, AuthService};
use crate::clock::SystemClock;
use crate::config::{Config, SessionBackendKind, SessionConfig};
use crate::error::Result;
use crate::session::{KvBackend, MemoryBackend};
use crate::store::{CredentialStore, MemoryCredentialStore, PostgresCredentialStore};

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub service: AuthService,
}

pub type SharedState = Arc<AppState>;

/// Connect the configured stores and assemble the authentication service
pub async fn build_state(config: Config) -> Result<SharedState> {
    config.validate()?;

    let store: Arc<dyn CredentialStore> = match &config.database {
        Some(database) => {
            let postgres = PostgresCredentialStore::connect(database).await?;
            postgres.migrate().await?;
            tracing::info!("Using PostgreSQL credential store");
            Arc::new(postgres)
        }
        None => {
            tracing::warn!("No [database] configured, users are kept in memory");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let backend = connect_session_backend(&config.session).await;
    let service = AuthService::from_config(&config, store, backend, Arc::new(SystemClock))?;

    Ok(Arc::new(AppState { service }))
}

/// Open the session backend, or return None to run without session tracking
pub async fn connect_session_backend(config: &SessionConfig) -> Option<Arc<dyn KvBackend>> {
    if !config.enabled {
        tracing::info!("Session tracking disabled");
        return None;
    }

    let backend: Arc<dyn KvBackend> = match config.backend {
        SessionBackendKind::Memory => {
            let memory = MemoryBackend::new();
            if config.sweep_interval_secs > 0 {
                memory.spawn_sweeper(std::time::Duration::from_secs(config.sweep_interval_secs));
            }
            Arc::new(memory)
        }
    };

    match tokio::time::timeout(config.backend_timeout(), backend.ping()).await {
        Ok(Ok(())) => Some(backend),
        Ok(Err(e)) => {
            tracing::warn!("Session backend unreachable, continuing without sessions: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("Session backend ping timed out, continuing without sessions");
            None
        }
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = build_state(config).await?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    serve(listener, state).await
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    let app = create_router(state);

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(routes::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(routes::health))
        .route("/auth/login", post(routes::login))
        .route("/auth/register", post(routes::register))
        .route("/auth/refresh", post(routes::refresh))
        .route("/auth/logout", post(routes::logout))
        .route("/auth/session/validate", post(routes::validate_session))
        .route("/auth/session/refresh", post(routes::refresh_session))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
