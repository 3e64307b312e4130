use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics::MetricsAggregator;

/// Handle to the background task that samples process resource usage.
///
/// Samples once immediately, then every `interval`. Dropping the handle
/// without calling [`shutdown`](Self::shutdown) also stops the task, since
/// the closed channel wakes it up.
pub struct PerformanceSampler {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PerformanceSampler {
    pub fn spawn(metrics: Arc<MetricsAggregator>, interval: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => metrics.record_performance(),
                    _ = &mut stopped => break,
                }
            }

            // Final sample so the history covers the whole process lifetime.
            metrics.record_performance();
            tracing::debug!("performance sampler stopped");
        });

        Self { stop, task }
    }

    /// Signal the task and wait for its final sample.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("performance sampler task failed: {e}");
        }
    }
}
