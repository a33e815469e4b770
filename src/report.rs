//! Periodic status digest.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::command::CommandError;
use crate::notifier::Notifier;
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::storage::StorageInfoProvider;
use crate::types::{HourlyReport, Severity};
use crate::usage::UsageSummaryProvider;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

pub struct HourlyReporter {
    runtime: Arc<dyn ContainerRuntime>,
    storage: StorageInfoProvider,
    usage: UsageSummaryProvider,
    notifier: Arc<dyn Notifier>,
    period: Duration,
}

impl HourlyReporter {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        storage: StorageInfoProvider,
        usage: UsageSummaryProvider,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            runtime,
            storage,
            usage,
            notifier,
            period: DEFAULT_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Report immediately, then once per period until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let ticked = tokio::select! {
                _ = ticker.tick() => shutdown.run_until_cancelled(self.tick()).await.is_some(),
                _ = shutdown.cancelled() => false,
            };
            if !ticked {
                info!("Hourly report task shutting down");
                break;
            }
        }
    }

    /// One tick. Failures are reported to the webhook and never returned.
    pub async fn tick(&self) {
        match self.gather().await {
            Ok(report) => {
                self.notifier
                    .notify(Severity::Info, report.into_notification())
                    .await;
                info!("Hourly report sent successfully");
            }
            Err(e) => {
                error!("Error sending hourly report: {}", e);
                self.notifier.error("Hourly Report Error", &e.to_string()).await;
            }
        }
    }

    async fn gather(&self) -> Result<HourlyReport, ReportError> {
        let (info, storage, usage) = tokio::try_join!(
            async { self.runtime.info().await.map_err(ReportError::from) },
            async { self.storage.listing().await.map_err(ReportError::from) },
            async { self.usage.summarize().await.map_err(ReportError::from) },
        )?;

        Ok(HourlyReport {
            storage,
            running_containers: info.running_containers,
            stopped_containers: info.stopped_containers,
            usage,
        })
    }
}
