use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use dbgrelay_core::registry::SessionRegistry;
use dbgrelay_debugger::Debugger;
use miette::IntoDiagnostic;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers;

/// State shared by the HTTP routes.
pub struct AppState {
    /// Active debugging sessions.
    pub registry: SessionRegistry<Debugger>,

    /// Interval between keep-alive comments on event streams.
    pub keep_alive: Duration,
}

impl AppState {
    /// Creates an empty state with the given configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            keep_alive: Duration::from_secs(config.keep_alive),
        }
    }
}

/// Builds the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/debugger",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/debugger/:index", delete(handlers::release_session))
        .route("/debugger/:index/continue", post(handlers::continue_session))
        .route("/debugger/:index/event", get(handlers::stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the HTTP server until Ctrl-C, then releases every session.
pub async fn serve(config: ServerConfig) -> miette::Result<()> {
    let state = Arc::new(AppState::new(&config));

    let listener = TcpListener::bind(&config.listen).await.into_diagnostic()?;

    tracing::info!(addr = %config.listen, "listening");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .into_diagnostic()
}

/// Waits for Ctrl-C, then releases every session so that their event
/// streams end and the server can drain its connections.
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");

    for (index, session) in state.registry.snapshot() {
        tracing::debug!(index, "releasing session on shutdown");
        state.registry.unregister(index);
        session.release().await;
    }
}
