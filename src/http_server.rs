use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get};
use prometheus_client::{encoding::text::encode, registry::Registry};
use tokio_util::sync::CancellationToken;
use tracing::info;

async fn get_metrics(registry: Arc<Registry>) -> axum::response::Response {
    let mut buffer = String::new();
    match encode(&mut buffer, &registry) {
        Ok(()) => buffer.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Exposes the search counters while the search runs.
pub struct Server {
    router: axum::Router,
}

impl Server {
    pub fn new(metrics_registry: Registry) -> Self {
        let metrics_registry = Arc::new(metrics_registry);
        let router = axum::Router::new()
            .route("/metrics", get(move || get_metrics(metrics_registry)))
            .layer(tower_http::catch_panic::CatchPanicLayer::new());
        Self { router }
    }

    pub async fn run(self, port: u16, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        info!("Serving metrics on {}", listener.local_addr()?);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(cancellation_token.cancelled_owned())
            .await?;
        Ok(())
    }
}
