//! Recorded data queue handler
//!
//! Accepts captured items and drains them towards the processor with
//! head-of-line blocking: on each pass the head item is dropped if expired or
//! invalid, emitted if ready, and otherwise blocks every item behind it until
//! a later pass. Only one pass runs at a time, so removal from the head and
//! submission to the single-worker executor happen in the same order.

use crate::config::QueueConfig;
use crate::error::{Result, SessionReplayError};
use crate::model::{InputEvent, SystemInformation};
use crate::processor::RecordedDataProcessor;
use crate::queue::executor::SerialExecutor;
use crate::queue::item::{InputEventItem, ItemState, QueueItem, ResourceItem, SnapshotItem};
use crate::queue::ordered::OrderedQueue;
use crate::session::{SessionContextHandler, SessionContextProvider};
use crate::telemetry::{QueueMetrics, QueueMetricsSnapshot, TELEMETRY_TARGET, TelemetrySampler};
use crate::time::{SystemTimeProvider, TimeProvider};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const ITEM_DROPPED_EXPIRED_MESSAGE: &str = "Session replay item dropped from queue: expired";
pub const ITEM_DROPPED_INVALID_MESSAGE: &str = "Session replay item dropped from queue: invalid";
pub const FAILED_TO_ADD_RECORDS_TO_QUEUE_ERROR_MESSAGE: &str =
    "Failed to add session replay item to queue";

/// Capture-side seam of the pipeline
pub trait DataQueueHandler: Send + Sync {
    /// Enqueue an in-flight snapshot; `None` when no valid session/view exists
    fn add_snapshot_item(&self, system_information: SystemInformation)
    -> Option<Arc<SnapshotItem>>;

    /// Enqueue a batch of input events; `None` when no valid session/view exists
    fn add_input_event_item(&self, events: Vec<InputEvent>) -> Option<Arc<InputEventItem>>;

    /// Enqueue an encoded resource; `None` when no valid session/view exists
    fn add_resource_item(
        &self,
        identifier: String,
        resource_data: Vec<u8>,
    ) -> Option<Arc<ResourceItem>>;

    /// Run one drain pass; never blocks on readiness and never fails
    fn try_to_consume_items(&self);

    /// Discard pending items and stop the executor
    fn clear_and_stop_processing_queue(&self);
}

/// Handler used while session replay is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDataQueueHandler;

impl DataQueueHandler for NoopDataQueueHandler {
    fn add_snapshot_item(&self, _system_information: SystemInformation) -> Option<Arc<SnapshotItem>> {
        None
    }

    fn add_input_event_item(&self, _events: Vec<InputEvent>) -> Option<Arc<InputEventItem>> {
        None
    }

    fn add_resource_item(
        &self,
        _identifier: String,
        _resource_data: Vec<u8>,
    ) -> Option<Arc<ResourceItem>> {
        None
    }

    fn try_to_consume_items(&self) {}

    fn clear_and_stop_processing_queue(&self) {}
}

#[derive(Debug, Clone, Copy)]
enum DropReason {
    Expired,
    Invalid,
}

/// Ordered queue of captured items drained into a [`RecordedDataProcessor`]
pub struct QueueHandler {
    queue: OrderedQueue<QueueItem>,
    drain_lock: Mutex<()>,
    executor: SerialExecutor,
    context_handler: SessionContextHandler,
    time_provider: Arc<dyn TimeProvider>,
    sampler: TelemetrySampler,
    metrics: Arc<QueueMetrics>,
    max_delay_ns: u64,
}

impl QueueHandler {
    /// Create a new handler builder
    pub fn builder() -> QueueHandlerBuilder {
        QueueHandlerBuilder::new()
    }

    /// Items still waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Append a prebuilt item, bypassing the identity check
    #[cfg(test)]
    pub(crate) fn offer(&self, item: QueueItem) -> Result<()> {
        self.queue.offer(item)
    }

    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn max_delay_ns(&self) -> u64 {
        self.max_delay_ns
    }

    /// Wait for already submitted items after the executor was stopped
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        self.executor.await_termination(timeout).await
    }

    fn creation_timestamp_ns(&self) -> u64 {
        self.time_provider.elapsed_time_ns()
    }

    fn insert(&self, item: QueueItem) {
        match self.queue.offer(item) {
            Ok(()) => self.metrics.record_enqueued(),
            Err(e) => {
                tracing::error!(error = %e, "{}", FAILED_TO_ADD_RECORDS_TO_QUEUE_ERROR_MESSAGE);
            }
        }
    }

    fn remove_head(&self) -> bool {
        match self.queue.poll_head() {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove item from session replay queue");
                false
            }
        }
    }

    fn report_drop(&self, item: &QueueItem, reason: DropReason, now_ns: u64) {
        match reason {
            DropReason::Expired => self.metrics.record_dropped_expired(),
            DropReason::Invalid => self.metrics.record_dropped_invalid(),
        }

        let message = match reason {
            DropReason::Expired => ITEM_DROPPED_EXPIRED_MESSAGE,
            DropReason::Invalid => ITEM_DROPPED_INVALID_MESSAGE,
        };
        let age_ns = now_ns.saturating_sub(item.creation_timestamp_ns());

        if self.sampler.sample() {
            tracing::warn!(
                target: TELEMETRY_TARGET,
                item_kind = %item.kind(),
                view_id = %item.context().view_id(),
                age_ns,
                "{}",
                message
            );
        } else {
            tracing::debug!(item_kind = %item.kind(), age_ns, "{}", message);
        }
    }

    fn drain(&self) {
        loop {
            let head = match self.queue.peek_head() {
                Ok(Some(head)) => head,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read session replay queue head");
                    break;
                }
            };

            let now_ns = self.time_provider.elapsed_time_ns();
            if head.is_expired(now_ns, self.max_delay_ns) {
                if !self.remove_head() {
                    break;
                }
                self.report_drop(&head, DropReason::Expired, now_ns);
                continue;
            }

            match head.state() {
                ItemState::Invalid => {
                    if !self.remove_head() {
                        break;
                    }
                    self.report_drop(&head, DropReason::Invalid, now_ns);
                    continue;
                }
                ItemState::NotReady => break,
                ItemState::Ready => {}
            }

            if !self.remove_head() {
                break;
            }
            let kind = head.kind();
            match self.executor.submit(head) {
                Ok(()) => self.metrics.record_emitted(),
                Err(e) => {
                    self.metrics.record_rejected();
                    tracing::warn!(item_kind = %kind, error = %e, "Ready item rejected by executor");
                }
            }
        }
    }
}

impl DataQueueHandler for QueueHandler {
    fn add_snapshot_item(&self, system_information: SystemInformation) -> Option<Arc<SnapshotItem>> {
        let context = self.context_handler.create_context_data()?;
        let item = Arc::new(SnapshotItem::new(
            context,
            system_information,
            self.creation_timestamp_ns(),
        ));
        self.insert(QueueItem::Snapshot(item.clone()));
        Some(item)
    }

    fn add_input_event_item(&self, events: Vec<InputEvent>) -> Option<Arc<InputEventItem>> {
        let context = self.context_handler.create_context_data()?;
        let item = Arc::new(InputEventItem::new(
            context,
            events,
            self.creation_timestamp_ns(),
        ));
        self.insert(QueueItem::InputEvent(item.clone()));
        Some(item)
    }

    fn add_resource_item(
        &self,
        identifier: String,
        resource_data: Vec<u8>,
    ) -> Option<Arc<ResourceItem>> {
        let context = self.context_handler.create_context_data()?;
        let item = Arc::new(ResourceItem::new(
            context,
            identifier,
            resource_data,
            self.creation_timestamp_ns(),
        ));
        self.insert(QueueItem::Resource(item.clone()));
        Some(item)
    }

    fn try_to_consume_items(&self) {
        let _drain = self.drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.drain();
    }

    fn clear_and_stop_processing_queue(&self) {
        let _drain = self.drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.queue.clear() {
            Ok(count) => {
                self.metrics.record_cleared(count as u64);
                tracing::debug!(cleared = count, "Session replay queue cleared");
            }
            Err(e) => tracing::error!(error = %e, "Failed to clear session replay queue"),
        }
        self.executor.shutdown();
    }
}

/// Builder for [`QueueHandler`]
pub struct QueueHandlerBuilder {
    processor: Option<Arc<dyn RecordedDataProcessor>>,
    context_provider: Option<Arc<dyn SessionContextProvider>>,
    time_provider: Option<Arc<dyn TimeProvider>>,
    runtime: Option<tokio::runtime::Handle>,
    config: QueueConfig,
}

impl QueueHandlerBuilder {
    /// Create a builder with default queue configuration
    pub fn new() -> Self {
        Self {
            processor: None,
            context_provider: None,
            time_provider: None,
            runtime: None,
            config: QueueConfig::default(),
        }
    }

    /// Processor receiving emitted items (required)
    pub fn processor(mut self, processor: Arc<dyn RecordedDataProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Session/view identity source (required)
    pub fn context_provider(mut self, provider: Arc<dyn SessionContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    /// Clock used for expiry and timestamps (defaults to the system clock)
    pub fn time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = Some(time_provider);
        self
    }

    /// Runtime hosting the executor worker (defaults to the current runtime)
    pub fn runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Queue configuration
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the handler and spawn its executor worker
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the processor or context provider
    /// is missing, or when no tokio runtime is available.
    pub fn build(self) -> Result<QueueHandler> {
        let processor = self.processor.ok_or_else(|| {
            SessionReplayError::Configuration("queue handler requires a processor".to_string())
        })?;
        let context_provider = self.context_provider.ok_or_else(|| {
            SessionReplayError::Configuration(
                "queue handler requires a session context provider".to_string(),
            )
        })?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => tokio::runtime::Handle::try_current().map_err(|e| {
                SessionReplayError::Configuration(format!("no tokio runtime available: {}", e))
            })?,
        };
        let time_provider = self
            .time_provider
            .unwrap_or_else(|| Arc::new(SystemTimeProvider::new()));

        let metrics = Arc::new(QueueMetrics::new());
        let executor = SerialExecutor::spawn_on(&runtime, processor, metrics.clone());
        let sampler = TelemetrySampler::from_rate(self.config.telemetry_sample_rate);
        tracing::debug!(
            max_delay = ?self.config.max_delay,
            telemetry_sampling = %sampler.policy(),
            "Session replay queue handler created"
        );

        Ok(QueueHandler {
            queue: OrderedQueue::new(),
            drain_lock: Mutex::new(()),
            executor,
            context_handler: SessionContextHandler::new(context_provider, time_provider.clone()),
            time_provider,
            sampler,
            metrics,
            max_delay_ns: self.config.max_delay_ns(),
        })
    }
}

impl Default for QueueHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
