//! Single-worker executor feeding the processor
//!
//! Submissions go through an unbounded channel drained by one tokio task, so
//! items reach the processor one at a time and in submission order.

use crate::error::{Result, SessionReplayError};
use crate::processor::{RecordedDataProcessor, dispatch};
use crate::queue::QueueItem;
use crate::telemetry::QueueMetrics;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// FIFO executor with exactly one worker
#[derive(Debug)]
pub struct SerialExecutor {
    sender: Mutex<Option<mpsc::UnboundedSender<QueueItem>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialExecutor {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(processor: Arc<dyn RecordedDataProcessor>, metrics: Arc<QueueMetrics>) -> Self {
        Self::spawn_on(&tokio::runtime::Handle::current(), processor, metrics)
    }

    /// Spawn the worker on the given runtime
    pub fn spawn_on(
        runtime: &tokio::runtime::Handle,
        processor: Arc<dyn RecordedDataProcessor>,
        metrics: Arc<QueueMetrics>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run_worker(receiver, processor, metrics));
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue an item for processing
    ///
    /// # Errors
    ///
    /// Returns [`SessionReplayError::ExecutorShutdown`] once the executor was
    /// shut down or its worker is gone.
    pub fn submit(&self, item: QueueItem) -> Result<()> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender
                .send(item)
                .map_err(|_| SessionReplayError::ExecutorShutdown),
            None => Err(SessionReplayError::ExecutorShutdown),
        }
    }

    /// Stop accepting items; already submitted items are still processed
    pub fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Wait for the worker to finish after [`shutdown`](Self::shutdown).
    ///
    /// Returns false if the worker did not finish within `timeout`.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match worker {
            Some(worker) => matches!(tokio::time::timeout(timeout, worker).await, Ok(Ok(()))),
            None => true,
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueueItem>,
    processor: Arc<dyn RecordedDataProcessor>,
    metrics: Arc<QueueMetrics>,
) {
    while let Some(item) = receiver.recv().await {
        let kind = item.kind();
        if let Err(e) = dispatch(processor.as_ref(), item).await {
            metrics.record_processor_failure();
            tracing::warn!(item_kind = %kind, error = %e, "Processor failed to handle item");
        }
    }
    tracing::debug!("Recorded data worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SystemInformation;
    use crate::processor::CollectingProcessor;
    use crate::queue::{InputEventItem, SnapshotItem};
    use crate::session::{RecordedQueuedItemContext, SessionReplayContext};

    fn context(version: u64) -> RecordedQueuedItemContext {
        RecordedQueuedItemContext {
            timestamp_ms: 0,
            document_version: version,
            context: SessionReplayContext::new("app", "session", "view"),
        }
    }

    #[tokio::test]
    async fn test_processes_in_submission_order() {
        let processor = Arc::new(CollectingProcessor::new());
        let executor = SerialExecutor::spawn(processor.clone(), Arc::new(QueueMetrics::new()));

        for version in 1..=20 {
            let item = if version % 2 == 0 {
                QueueItem::InputEvent(Arc::new(InputEventItem::new(context(version), Vec::new(), 0)))
            } else {
                QueueItem::Snapshot(Arc::new(SnapshotItem::new(
                    context(version),
                    SystemInformation::default(),
                    0,
                )))
            };
            executor.submit(item).unwrap();
        }

        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(1)).await);

        let versions: Vec<u64> = processor
            .records()
            .iter()
            .map(|record| record.context.document_version)
            .collect();
        assert_eq!(versions, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_rejects_after_shutdown() {
        let processor = Arc::new(CollectingProcessor::new());
        let executor = SerialExecutor::spawn(processor.clone(), Arc::new(QueueMetrics::new()));
        executor.shutdown();
        assert!(executor.is_shutdown());

        let item = QueueItem::InputEvent(Arc::new(InputEventItem::new(context(1), Vec::new(), 0)));
        assert!(matches!(
            executor.submit(item),
            Err(SessionReplayError::ExecutorShutdown)
        ));
        assert!(executor.await_termination(Duration::from_secs(1)).await);
        assert!(processor.is_empty());
    }

    #[tokio::test]
    async fn test_processor_failure_is_counted() {
        let processor = Arc::new(
            CollectingProcessor::new().failing_on([crate::queue::QueueItemKind::InputEvent]),
        );
        let metrics = Arc::new(QueueMetrics::new());
        let executor = SerialExecutor::spawn(processor.clone(), metrics.clone());

        executor
            .submit(QueueItem::InputEvent(Arc::new(InputEventItem::new(
                context(1),
                Vec::new(),
                0,
            ))))
            .unwrap();
        executor
            .submit(QueueItem::Snapshot(Arc::new(SnapshotItem::new(
                context(2),
                SystemInformation::default(),
                0,
            ))))
            .unwrap();

        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(1)).await);
        assert_eq!(metrics.snapshot().processor_failures, 1);
        assert_eq!(processor.len(), 1);
    }
}
