//! Optional status server: `GET /health` and `GET /metrics`.

pub mod health;
pub mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use crate::metrics::AppMetrics;

pub fn status_router(app_metrics: Arc<AppMetrics>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::metrics))
        .with_state(app_metrics)
}

/// Bind `addr` and serve the status router in a background task.
///
/// Returns the bound address (useful when `addr` has port 0).
pub async fn serve_status(
    addr: SocketAddr,
    app_metrics: Arc<AppMetrics>,
) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = status_router(app_metrics);

    tracing::info!("Status server listening on http://{}", local_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Status server error: {}", e);
        }
    });

    Ok(local_addr)
}
