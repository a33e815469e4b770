use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub mod docker;
pub use docker::DockerRuntime;

/// Live sequence of raw event records. Dropping it closes the subscription.
pub type EventStream = BoxStream<'static, Result<serde_json::Value, RuntimeError>>;

/// Aggregate counters reported by the runtime daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub running_containers: u64,
    pub stopped_containers: u64,
    pub server_version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to connect to container runtime: {0}")]
    Connection(String),
    #[error("container runtime query failed: {0}")]
    Query(String),
    #[error("{0}")]
    Stream(String),
    #[error("malformed event record: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Query running/stopped container counts and the daemon version.
    async fn info(&self) -> Result<RuntimeInfo, RuntimeError>;

    /// Open a live event subscription.
    async fn events(&self) -> Result<EventStream, RuntimeError>;
}
