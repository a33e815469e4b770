//! Docker event notifier entry point.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod classifier;
mod command;
mod config;
mod dispatcher;
mod health;
mod notifier;
mod report;
mod runtime;
mod storage;
mod types;
mod usage;

use command::{CommandRunner, ShellRunner};
use config::Config;
use dispatcher::EventDispatcher;
use health::HealthServer;
use notifier::{DiscordNotifier, Notifier};
use report::HourlyReporter;
use runtime::{ContainerRuntime, DockerRuntime};
use storage::StorageInfoProvider;
use usage::UsageSummaryProvider;

/// How long each task gets to wind down before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration
    let cfg = Config::load()?;
    info!(
        "Starting {} (full notifications: {}, report every {:?})",
        cfg.name,
        cfg.full_notifications,
        cfg.report_interval()
    );

    // Container Runtime (Docker). Nothing is served until the daemon answers.
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerRuntime::connect()?);
    match runtime.info().await {
        Ok(info) => info!(
            "Successfully connected to Docker. Docker version: {}",
            info.server_version.as_deref().unwrap_or("unknown")
        ),
        Err(e) => {
            error!("Failed to start due to Docker connection error: {}", e);
            return Err(e.into());
        }
    }

    let notifier: Arc<dyn Notifier> = Arc::new(DiscordNotifier::new(
        cfg.webhook_url.clone(),
        cfg.name.clone(),
        cfg.production,
    ));
    let shutdown = CancellationToken::new();

    // Health endpoint
    let listener = HealthServer::bind(cfg.health_addr()?).await?;
    let health_shutdown = shutdown.clone();
    let name = cfg.name.clone();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = HealthServer::new(&name).serve(listener, health_shutdown).await {
            error!("Health endpoint failed: {}", e);
        }
    });
    let started = format!(
        "{} is running on port {} on {}",
        cfg.name,
        cfg.port,
        health::platform()
    );
    info!("{}", started);
    notifier.info("Server Started", &started, Vec::new()).await;

    // Hourly report
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner);
    let reporter = HourlyReporter::new(
        Arc::clone(&runtime),
        StorageInfoProvider::new(Arc::clone(&runner), cfg.storage_command()),
        UsageSummaryProvider::new(runner, cfg.usage_command.clone()),
        Arc::clone(&notifier),
    )
    .with_period(cfg.report_interval());
    let report_shutdown = shutdown.clone();
    let report_handle = tokio::spawn(async move { reporter.run(report_shutdown).await });

    // Event stream
    let dispatcher = EventDispatcher::new(Arc::clone(&notifier), cfg.full_notifications)
        .with_reconnect_attempts(cfg.stream_reconnect_attempts);
    let events_shutdown = shutdown.clone();
    let events_runtime = Arc::clone(&runtime);
    let events_handle = tokio::spawn(async move {
        dispatcher
            .start(events_runtime.as_ref(), events_shutdown)
            .await;
        info!("Event dispatcher stopped");
    });

    // Graceful Shutdown
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    shutdown.cancel();
    for (task, handle) in [
        ("health endpoint", health_handle),
        ("hourly report", report_handle),
        ("event dispatcher", events_handle),
    ] {
        let mut handle = handle;
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Task {} did not stop cleanly: {}", task, e),
            Err(_) => {
                warn!("Task {} still running after {:?}, aborting", task, SHUTDOWN_GRACE);
                handle.abort();
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
