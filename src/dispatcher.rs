//! Event subscription loop.
//!
//! Records are handled strictly one at a time, so notifications leave in the
//! order the runtime emitted the events.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::classifier::notification_for;
use crate::notifier::Notifier;
use crate::runtime::{ContainerRuntime, EventStream, RuntimeError};
use crate::types::{EventSeverity, Notification, RuntimeEvent};

const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How a single subscription finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The remote end closed the stream.
    Closed { delivered: usize },
    Cancelled,
}

pub struct EventDispatcher {
    notifier: Arc<dyn Notifier>,
    enabled: bool,
    reconnect_attempts: u32,
}

impl EventDispatcher {
    /// `enabled == false` mutes per-event traffic while still draining the stream.
    pub fn new(notifier: Arc<dyn Notifier>, enabled: bool) -> Self {
        Self {
            notifier,
            enabled,
            reconnect_attempts: 0,
        }
    }

    /// Resubscribe up to `attempts` times after the stream closes.
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Subscribe and consume events until the stream ends or `shutdown` fires.
    ///
    /// A failed subscription sends one error notification and returns; it
    /// never takes the rest of the process down.
    pub async fn start(&self, runtime: &dyn ContainerRuntime, shutdown: CancellationToken) {
        let mut failures = 0u32;
        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => return,
                subscription = runtime.events() => match subscription {
                    Ok(stream) => self.run(stream, shutdown.clone()).await,
                    Err(e) => {
                        error!("Error connecting to Docker events: {}", e);
                        let message = e.to_string();
                        let notice = self.notifier.error("Docker Connection Error", &message);
                        match shutdown.run_until_cancelled(notice).await {
                            Some(()) => StreamEnd::Closed { delivered: 0 },
                            None => StreamEnd::Cancelled,
                        }
                    }
                },
            };

            let delivered = match outcome {
                StreamEnd::Cancelled => return,
                StreamEnd::Closed { delivered } => delivered,
            };
            if delivered > 0 {
                failures = 0;
            }
            if failures >= self.reconnect_attempts {
                return;
            }

            let delay = backoff(failures);
            failures += 1;
            warn!(
                "Resubscribing to Docker events in {:?} (attempt {}/{})",
                delay, failures, self.reconnect_attempts
            );
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Drain one event stream.
    ///
    /// Shutdown is honoured while waiting for a record and while a webhook
    /// call is in flight.
    pub async fn run(&self, mut stream: EventStream, shutdown: CancellationToken) -> StreamEnd {
        let mut delivered = 0;
        loop {
            let Some(record) = shutdown.run_until_cancelled(stream.next()).await else {
                return StreamEnd::Cancelled;
            };

            let handled = match record {
                Some(Ok(raw)) => match RuntimeEvent::decode(raw) {
                    Ok(event) => {
                        delivered += 1;
                        shutdown.run_until_cancelled(self.dispatch(&event)).await
                    }
                    Err(e) => {
                        warn!("Skipping undecodable Docker event: {}", e);
                        Some(())
                    }
                },
                Some(Err(RuntimeError::Decode(e))) => {
                    warn!("Skipping undecodable Docker event: {}", e);
                    Some(())
                }
                Some(Err(e)) => {
                    error!("Error in Docker event stream: {}", e);
                    let message = e.to_string();
                    let notice = async {
                        if self.enabled {
                            self.notifier.error("Docker Event Stream Error", &message).await;
                        }
                    };
                    shutdown.run_until_cancelled(notice).await
                }
                None => {
                    info!("Docker event stream ended");
                    let notice = async {
                        if self.enabled {
                            self.notifier
                                .info("Docker Event Stream", "Event stream has ended", Vec::new())
                                .await;
                        }
                    };
                    return match shutdown.run_until_cancelled(notice).await {
                        Some(()) => StreamEnd::Closed { delivered },
                        None => StreamEnd::Cancelled,
                    };
                }
            };

            if handled.is_none() {
                return StreamEnd::Cancelled;
            }
        }
    }

    async fn dispatch(&self, event: &RuntimeEvent) {
        if !self.enabled {
            return;
        }
        debug!("Received Docker event: {} {}", event.kind, event.action);
        let (severity, notification) = notification_for(event);
        let Notification {
            title,
            description,
            fields,
        } = notification;
        match severity {
            EventSeverity::Success => self.notifier.success(&title, &description, fields).await,
            EventSeverity::Info => self.notifier.info(&title, &description, fields).await,
            EventSeverity::Log { color } => {
                let notification = Notification::new(title, description).with_fields(fields);
                self.notifier.log(notification, color).await
            }
        }
    }
}

fn backoff(failures: u32) -> Duration {
    INITIAL_BACKOFF
        .saturating_mul(2u32.saturating_pow(failures))
        .min(MAX_BACKOFF)
}
