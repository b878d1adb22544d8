//! Downstream processors receiving emitted queue items
//!
//! The queue handler hands every ready item to exactly one
//! [`RecordedDataProcessor`] call, in emission order. Processors own their
//! failures: an error is logged by the worker and never fed back into the
//! queue.
//!
//! # Example
//!
//! ```rust,no_run
//! use session_replay_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(provider: Arc<dyn SessionContextProvider>) -> Result<()> {
//! let processor = Arc::new(CollectingProcessor::new());
//! let handler = QueueHandler::builder()
//!     .processor(processor.clone())
//!     .context_provider(provider)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SessionReplayError};
use crate::model::SystemInformation;
use crate::queue::{InputEventItem, QueueItem, QueueItemKind, ResourceItem, SnapshotItem};
use crate::session::RecordedQueuedItemContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Turns ready queue items into persisted records
#[async_trait]
pub trait RecordedDataProcessor: Send + Sync {
    /// Called for each emitted snapshot
    async fn process_screen_snapshots(&self, item: Arc<SnapshotItem>) -> Result<()>;

    /// Called for each emitted batch of input events
    async fn process_input_events(&self, item: Arc<InputEventItem>) -> Result<()>;

    /// Called for each emitted resource
    async fn process_resources(&self, item: Arc<ResourceItem>) -> Result<()>;
}

/// Route an item to the matching processor call
pub async fn dispatch(processor: &dyn RecordedDataProcessor, item: QueueItem) -> Result<()> {
    match item {
        QueueItem::Snapshot(item) => processor.process_screen_snapshots(item).await,
        QueueItem::InputEvent(item) => processor.process_input_events(item).await,
        QueueItem::Resource(item) => processor.process_resources(item).await,
    }
}

/// Kind-specific summary of an emitted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmittedPayload {
    Snapshot {
        node_count: usize,
        system_information: SystemInformation,
    },
    InputEvents {
        event_count: usize,
    },
    Resource {
        identifier: String,
        size: usize,
    },
}

/// One emission observed by a [`CollectingProcessor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedRecord {
    /// Emission index, starting at 0
    pub sequence: u64,
    /// Item kind
    pub kind: QueueItemKind,
    /// Identity stamped at capture
    pub context: RecordedQueuedItemContext,
    /// Kind-specific summary
    pub payload: EmittedPayload,
}

impl EmittedRecord {
    fn from_item(sequence: u64, item: &QueueItem) -> Self {
        let payload = match item {
            QueueItem::Snapshot(snapshot) => EmittedPayload::Snapshot {
                node_count: snapshot.node_count(),
                system_information: snapshot.system_information().clone(),
            },
            QueueItem::InputEvent(events) => EmittedPayload::InputEvents {
                event_count: events.events().len(),
            },
            QueueItem::Resource(resource) => EmittedPayload::Resource {
                identifier: resource.identifier().to_string(),
                size: resource.resource_data().len(),
            },
        };
        Self {
            sequence,
            kind: item.kind(),
            context: item.context().clone(),
            payload,
        }
    }
}

/// Processor that keeps every emitted item in order
pub struct CollectingProcessor {
    items: Mutex<Vec<QueueItem>>,
    failing_kinds: HashSet<QueueItemKind>,
    count_tx: watch::Sender<usize>,
}

impl CollectingProcessor {
    /// Create an empty collector
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            items: Mutex::new(Vec::new()),
            failing_kinds: HashSet::new(),
            count_tx,
        }
    }

    /// Reject items of the given kinds instead of collecting them
    pub fn failing_on(mut self, kinds: impl IntoIterator<Item = QueueItemKind>) -> Self {
        self.failing_kinds = kinds.into_iter().collect();
        self
    }

    fn collect(&self, item: QueueItem) -> Result<()> {
        let kind = item.kind();
        if self.failing_kinds.contains(&kind) {
            return Err(SessionReplayError::Processor(format!(
                "{} rejected by collector",
                kind
            )));
        }

        let count = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
            items.push(item);
            items.len()
        };
        self.count_tx.send_replace(count);
        Ok(())
    }

    /// Emitted items, in emission order
    pub fn items(&self) -> Vec<QueueItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Emitted items as serializable records
    pub fn records(&self) -> Vec<EmittedRecord> {
        self.items()
            .iter()
            .enumerate()
            .map(|(index, item)| EmittedRecord::from_item(index as u64, item))
            .collect()
    }

    pub fn len(&self) -> usize {
        *self.count_tx.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` items were collected; false on timeout
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let mut count_rx = self.count_tx.subscribe();
        tokio::time::timeout(timeout, count_rx.wait_for(|collected| *collected >= count))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false)
    }
}

impl Default for CollectingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordedDataProcessor for CollectingProcessor {
    async fn process_screen_snapshots(&self, item: Arc<SnapshotItem>) -> Result<()> {
        self.collect(QueueItem::Snapshot(item))
    }

    async fn process_input_events(&self, item: Arc<InputEventItem>) -> Result<()> {
        self.collect(QueueItem::InputEvent(item))
    }

    async fn process_resources(&self, item: Arc<ResourceItem>) -> Result<()> {
        self.collect(QueueItem::Resource(item))
    }
}

/// Processor that only logs emissions
pub struct LoggingProcessor;

#[async_trait]
impl RecordedDataProcessor for LoggingProcessor {
    async fn process_screen_snapshots(&self, item: Arc<SnapshotItem>) -> Result<()> {
        tracing::info!(
            view_id = %item.context().view_id(),
            document_version = item.context().document_version,
            node_count = item.node_count(),
            "Snapshot emitted"
        );
        Ok(())
    }

    async fn process_input_events(&self, item: Arc<InputEventItem>) -> Result<()> {
        tracing::info!(
            view_id = %item.context().view_id(),
            event_count = item.events().len(),
            "Input events emitted"
        );
        Ok(())
    }

    async fn process_resources(&self, item: Arc<ResourceItem>) -> Result<()> {
        tracing::info!(
            identifier = %item.identifier(),
            size = item.resource_data().len(),
            "Resource emitted"
        );
        Ok(())
    }
}
