use super::{ContainerRuntime, EventStream, RuntimeError, RuntimeInfo};
use async_trait::async_trait;
use bollard::errors::Error as BollardError;
use bollard::system::EventsOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;
use log::{debug, info};

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon using default settings.
    /// This handles the unix socket on Linux, the named pipe on Windows and
    /// honours `DOCKER_HOST`.
    pub fn connect() -> Result<Self, RuntimeError> {
        info!("Detected platform: {}", std::env::consts::OS);
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn info(&self) -> Result<RuntimeInfo, RuntimeError> {
        debug!("Fetching Docker info...");
        let info = self
            .docker
            .info()
            .await
            .map_err(|e| RuntimeError::Query(e.to_string()))?;

        Ok(RuntimeInfo {
            running_containers: count(info.containers_running),
            stopped_containers: count(info.containers_stopped),
            server_version: info.server_version,
        })
    }

    async fn events(&self) -> Result<EventStream, RuntimeError> {
        // The events endpoint is lazy; ping first so an unreachable daemon
        // surfaces as a subscription failure rather than a stream error.
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;

        let stream = self
            .docker
            .events(None::<EventsOptions<String>>)
            .map(|msg| match msg {
                Ok(event) => {
                    serde_json::to_value(event).map_err(|e| RuntimeError::Decode(e.to_string()))
                }
                Err(e) => Err(classify_stream_error(e)),
            });

        info!("Listening for Docker events...");
        Ok(stream.boxed())
    }
}

fn classify_stream_error(err: BollardError) -> RuntimeError {
    match err {
        BollardError::JsonDataError { .. } | BollardError::JsonSerdeError { .. } => {
            RuntimeError::Decode(err.to_string())
        }
        other => RuntimeError::Stream(other.to_string()),
    }
}

fn count(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}
