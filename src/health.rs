//! Liveness endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use log::info;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub name: String,
    pub platform: &'static str,
}

/// Host platform in the naming existing dashboards expect (`linux`, `win32`, `darwin`).
pub fn platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

async fn health(State(name): State<Arc<str>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        name: name.to_string(),
        platform: platform(),
    })
}

pub struct HealthServer {
    router: axum::Router,
}

impl HealthServer {
    pub fn new(name: &str) -> Self {
        let router = axum::Router::new()
            .route("/health", get(health))
            .with_state(Arc::<str>::from(name));
        Self { router }
    }

    pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind health endpoint on {}: {}", addr, e))
    }

    /// Serve until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        info!("Health endpoint listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}
