//! Periodic registry refresh.
//!
//! Responsibilities:
//! - Background rescan loop on a fixed interval
//! - Manual refresh coordination
//! - Graceful stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::ErrorCode;
use crate::registry::DeviceRegistry;

/// Runs [`DeviceRegistry::refresh`] in the background.
///
/// A failed pass is logged and the loop keeps going; only
/// [`RefreshMonitor::shutdown`] stops it.
pub struct RefreshMonitor {
    registry: Arc<DeviceRegistry>,
    /// Interval between automatic refreshes.
    interval: Duration,
    refresh_notify: Notify,
    /// Token to signal the background task to stop.
    cancel_token: CancellationToken,
}

impl RefreshMonitor {
    /// Creates a new monitor.
    ///
    /// # Arguments
    /// * `registry` - Registry to refresh
    /// * `interval` - Interval between automatic refreshes
    pub fn new(registry: Arc<DeviceRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            refresh_notify: Notify::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Triggers a refresh now and pushes back the next automatic one.
    pub fn trigger_refresh(&self) {
        self.refresh_notify.notify_one();
    }

    /// Stops the background loop.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Starts the background loop.
    ///
    /// The first automatic refresh runs one interval after start; the
    /// initial population is the caller's job.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            log::info!("[RefreshMonitor] Started (interval: {:?})", self.interval);

            loop {
                let is_manual_refresh = tokio::select! {
                    _ = cancel_token.cancelled() => {
                        log::info!("[RefreshMonitor] Shutting down refresh loop");
                        break;
                    }
                    _ = interval.tick() => false,
                    _ = self.refresh_notify.notified() => {
                        log::info!("[RefreshMonitor] Manual refresh triggered");
                        true
                    }
                };

                // Reset interval after manual refresh to push back automatic refresh
                if is_manual_refresh {
                    interval.reset();
                }

                // A pass abandoned here never reaches the merge, so the
                // registry keeps its previous contents.
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        log::info!("[RefreshMonitor] Shutting down during refresh");
                        break;
                    }
                    result = self.registry.refresh() => {
                        if let Err(e) = result {
                            log::error!("[RefreshMonitor] Refresh failed ({}): {}", e.code(), e);
                        }
                    }
                }
            }
        })
    }
}
