//! HTTP surface of the pattern generator.

pub mod errors;
pub mod handlers;
pub mod state;

use crate::core::Storage;
use crate::domain::{JitterGridRequest, PoissonRequest, SunflowerRequest};
use crate::utils::error::Result;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use errors::ApiError;
pub use state::AppState;

pub fn build_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::<S>))
        .route(
            "/generate/jitter-grid",
            post(handlers::generate::<S, JitterGridRequest>),
        )
        .route(
            "/generate/sunflower",
            post(handlers::generate::<S, SunflowerRequest>),
        )
        .route("/generate/poisson", post(handlers::generate::<S, PoissonRequest>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
