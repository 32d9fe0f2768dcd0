use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::LegalBackend;

pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Message shown whenever a health check fails.
pub const UNAVAILABLE_MESSAGE: &str = "Service unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Checking,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Checking => "checking",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub message: String,
}

/// Tracks backend liveness. Starts in `Checking` and re-enters it on every
/// check.
///
/// Overlapping checks are not deduplicated: whichever request completes last
/// decides the final state.
pub struct HealthMonitor {
    backend: Arc<dyn LegalBackend>,
    state: watch::Sender<HealthSnapshot>,
}

impl HealthMonitor {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        let (state, _) = watch::channel(HealthSnapshot {
            status: HealthStatus::Checking,
            message: String::new(),
        });
        Self { backend, state }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.state.borrow().clone()
    }

    /// Run one check to completion and publish its outcome.
    pub async fn check_health(&self) -> HealthSnapshot {
        self.state.send_modify(|s| s.status = HealthStatus::Checking);

        let next = match self.backend.health().await {
            Ok(message) => HealthSnapshot {
                status: HealthStatus::Healthy,
                message,
            },
            Err(e) => {
                warn!(error = %e, "backend health check failed");
                HealthSnapshot {
                    status: HealthStatus::Unhealthy,
                    message: UNAVAILABLE_MESSAGE.to_string(),
                }
            }
        };
        debug!(status = next.status.label(), "health updated");
        self.state.send_replace(next.clone());
        next
    }

    /// Manual check on its own task, independent of any in-flight one.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<HealthSnapshot> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.check_health().await })
    }

    /// Poll every `period`, first check immediately. Polling ends when the
    /// returned handle is stopped or dropped.
    pub fn start(self: &Arc<Self>, period: Duration) -> HealthTask {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.check_health().await;
            }
        });
        info!(period_secs = period.as_secs_f64(), "health polling started");
        HealthTask { handle }
    }
}

/// Handle to the polling loop.
pub struct HealthTask {
    handle: JoinHandle<()>,
}

impl HealthTask {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for HealthTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("health polling stopped");
    }
}
