use super::{epoch_ms, Hub};
use std::sync::Arc;
use tokio::task::JoinHandle;

impl Hub {
    /// One eviction pass. Stale locations go quietly (only an explicit
    /// `stop_sharing` broadcasts a stop) and drained rate windows are
    /// forgotten.
    pub fn sweep(&self, now: u64) {
        let evicted = self.locations.sweep(now, self.config.location_ttl_ms());
        self.rate.sweep(now);
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = self.locations.len(),
                "evicted stale locations"
            );
        }
    }

    /// Periodic sweep on the configured interval. The returned handle is
    /// aborted at shutdown.
    pub fn spawn_janitor(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.sweep_interval);
            loop {
                interval.tick().await;
                self.sweep(epoch_ms());
            }
        })
    }
}
