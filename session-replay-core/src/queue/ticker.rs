//! Periodic drain tick

use crate::queue::handler::DataQueueHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run a drain pass every `interval` until `cancel` fires.
///
/// Covers readiness changes that no enqueue or decrement observed, such as a
/// traversal finishing without sub-tasks, and lets stale heads expire.
pub fn spawn_periodic_drain(
    handler: Arc<dyn DataQueueHandler>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => handler.try_to_consume_items(),
            }
        }
        tracing::debug!("Periodic drain stopped");
    })
}
