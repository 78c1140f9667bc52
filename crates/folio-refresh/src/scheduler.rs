//! Recurring scheduler task driving the coordinator.
//!
//! One tokio task ticks on a fixed interval (daily by default) and calls
//! [`RefreshCoordinator::evaluate_and_refresh`]. Ticks run serially by
//! construction: the next tick is not polled until the previous evaluation
//! finished. The first tick fires immediately at startup so a freshly booted
//! process brings the view up to date without waiting a full interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use folio_core::{defaults, EvaluateOutcome};

use crate::coordinator::RefreshCoordinator;

/// Configuration for the recurring refresh task.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between evaluate-and-refresh ticks.
    pub interval: Duration,
    /// Whether the scheduled task runs at all.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::REFRESH_INTERVAL_SECS),
            enabled: true,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MV_REFRESH_ENABLED` | `true` | Enable/disable the recurring task |
    /// | `MV_REFRESH_INTERVAL_SECS` | `86400` | Seconds between ticks |
    pub fn from_env() -> Self {
        let enabled = std::env::var("MV_REFRESH_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let interval = std::env::var("MV_REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(defaults::REFRESH_INTERVAL_SECS));

        Self { interval, enabled }
    }

    /// Set the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable the recurring task.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Handle for controlling the running scheduler task.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop and wait for the task to finish.
    pub async fn shutdown(self) {
        // Receiver may already be gone if the task exited; that's fine.
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

/// Recurring refresh task.
pub struct RefreshScheduler {
    coordinator: Arc<RefreshCoordinator>,
    config: SchedulerConfig,
}

impl RefreshScheduler {
    pub fn new(coordinator: Arc<RefreshCoordinator>, config: SchedulerConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Spawn the recurring task and return a handle for shutdown.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let join = tokio::spawn(async move {
            if !self.config.enabled {
                info!(
                    subsystem = "refresh",
                    component = "scheduler",
                    "Recurring refresh task disabled by configuration"
                );
                return;
            }

            info!(
                subsystem = "refresh",
                component = "scheduler",
                interval_secs = self.config.interval.as_secs(),
                view_name = self.coordinator.view_name(),
                "Recurring refresh task started"
            );

            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.coordinator.evaluate_and_refresh().await {
                            EvaluateOutcome::SkippedExternallyManaged => {
                                debug!(
                                    subsystem = "refresh",
                                    component = "scheduler",
                                    op = "tick",
                                    "Tick skipped, database job owns refresh duty"
                                );
                            }
                            EvaluateOutcome::Refreshed(report) => {
                                debug!(
                                    subsystem = "refresh",
                                    component = "scheduler",
                                    op = "tick",
                                    success = report.success,
                                    duration_ms = report.duration_ms,
                                    "Tick performed application-level refresh"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!(
                            subsystem = "refresh",
                            component = "scheduler",
                            "Recurring refresh task stopped"
                        );
                        break;
                    }
                }
            }
        });

        SchedulerHandle { shutdown_tx, join }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_daily() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(86_400));
        assert!(config.enabled);
    }

    #[test]
    fn test_config_builder() {
        let config = SchedulerConfig::default()
            .with_interval(Duration::from_secs(60))
            .with_enabled(false);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(!config.enabled);
    }
}
