//! Queue items and their validity/readiness contract

use crate::model::{InputEvent, Node, SystemInformation};
use crate::session::RecordedQueuedItemContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Discriminant of a [`QueueItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemKind {
    Snapshot,
    InputEvent,
    Resource,
}

impl fmt::Display for QueueItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueItemKind::Snapshot => "snapshot",
            QueueItemKind::InputEvent => "input_event",
            QueueItemKind::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Screen snapshot whose node tree may still be under construction.
///
/// Producers keep an `Arc` to the item after enqueueing it: the traversal
/// fills in the nodes and marks itself finished, and every asynchronous
/// sub-task (resource encoding) brackets its work with
/// [`increment_pending_jobs`](Self::increment_pending_jobs) /
/// [`decrement_pending_jobs`](Self::decrement_pending_jobs). Each increment
/// must be matched by exactly one decrement, otherwise the snapshot never
/// becomes ready and eventually expires at the head of the queue.
#[derive(Debug)]
pub struct SnapshotItem {
    context: RecordedQueuedItemContext,
    creation_timestamp_ns: u64,
    system_information: SystemInformation,
    nodes: RwLock<Vec<Node>>,
    traversal_finished: AtomicBool,
    pending_jobs: AtomicUsize,
}

impl SnapshotItem {
    /// Create an in-flight snapshot with no nodes
    pub fn new(
        context: RecordedQueuedItemContext,
        system_information: SystemInformation,
        creation_timestamp_ns: u64,
    ) -> Self {
        Self {
            context,
            creation_timestamp_ns,
            system_information,
            nodes: RwLock::new(Vec::new()),
            traversal_finished: AtomicBool::new(false),
            pending_jobs: AtomicUsize::new(0),
        }
    }

    pub fn context(&self) -> &RecordedQueuedItemContext {
        &self.context
    }

    pub fn creation_timestamp_ns(&self) -> u64 {
        self.creation_timestamp_ns
    }

    pub fn system_information(&self) -> &SystemInformation {
        &self.system_information
    }

    /// Copy of the collected nodes
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Replace the collected nodes
    pub fn set_nodes(&self, nodes: Vec<Node>) {
        *self.nodes.write().unwrap_or_else(PoisonError::into_inner) = nodes;
    }

    /// Signal that tree traversal is complete
    pub fn mark_traversal_finished(&self) {
        self.traversal_finished.store(true, Ordering::Release);
    }

    /// Store the final nodes and mark traversal as complete
    pub fn finish_traversal(&self, nodes: Vec<Node>) {
        self.set_nodes(nodes);
        self.mark_traversal_finished();
    }

    pub fn is_traversal_finished(&self) -> bool {
        self.traversal_finished.load(Ordering::Acquire)
    }

    /// Register an outstanding asynchronous sub-task; returns the new count
    pub fn increment_pending_jobs(&self) -> usize {
        self.pending_jobs.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Complete an asynchronous sub-task; returns the new count.
    ///
    /// Saturates at zero: a surplus decrement leaves the counter untouched.
    pub fn decrement_pending_jobs(&self) -> usize {
        match self
            .pending_jobs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |jobs| {
                jobs.checked_sub(1)
            }) {
            Ok(previous) => previous - 1,
            Err(_) => {
                tracing::debug!("Pending job decrement on a snapshot with no pending jobs");
                0
            }
        }
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs.load(Ordering::Acquire)
    }

    /// Classify the snapshot from one read of the traversal flag.
    ///
    /// The flag only ever goes from unset to set and the nodes are stored
    /// before it is set, so a snapshot seen as finished here stays finished
    /// with the same nodes.
    pub fn state(&self) -> ItemState {
        if !self.is_traversal_finished() {
            return ItemState::NotReady;
        }
        if self.node_count() == 0 {
            return ItemState::Invalid;
        }
        if self.pending_jobs() > 0 {
            ItemState::NotReady
        } else {
            ItemState::Ready
        }
    }

    /// Invalid only once traversal finished without producing any node
    pub fn is_valid(&self) -> bool {
        self.state() != ItemState::Invalid
    }

    /// Traversal finished with nodes and no asynchronous sub-task outstanding
    pub fn is_ready(&self) -> bool {
        self.state() == ItemState::Ready
    }
}

/// Batch of input events captured together
#[derive(Debug, Clone)]
pub struct InputEventItem {
    context: RecordedQueuedItemContext,
    creation_timestamp_ns: u64,
    events: Vec<InputEvent>,
}

impl InputEventItem {
    pub fn new(
        context: RecordedQueuedItemContext,
        events: Vec<InputEvent>,
        creation_timestamp_ns: u64,
    ) -> Self {
        Self {
            context,
            creation_timestamp_ns,
            events,
        }
    }

    pub fn context(&self) -> &RecordedQueuedItemContext {
        &self.context
    }

    pub fn creation_timestamp_ns(&self) -> u64 {
        self.creation_timestamp_ns
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }
}

/// Encoded resource (e.g. an image) referenced by snapshots
#[derive(Debug, Clone)]
pub struct ResourceItem {
    context: RecordedQueuedItemContext,
    creation_timestamp_ns: u64,
    identifier: String,
    resource_data: Vec<u8>,
}

impl ResourceItem {
    pub fn new(
        context: RecordedQueuedItemContext,
        identifier: impl Into<String>,
        resource_data: Vec<u8>,
        creation_timestamp_ns: u64,
    ) -> Self {
        Self {
            context,
            creation_timestamp_ns,
            identifier: identifier.into(),
            resource_data,
        }
    }

    pub fn context(&self) -> &RecordedQueuedItemContext {
        &self.context
    }

    pub fn creation_timestamp_ns(&self) -> u64 {
        self.creation_timestamp_ns
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn resource_data(&self) -> &[u8] {
        &self.resource_data
    }

    pub fn is_valid(&self) -> bool {
        !self.resource_data.is_empty()
    }
}

/// What a drain pass does with the head item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Remove and drop
    Invalid,
    /// Keep at the head and end the pass
    NotReady,
    /// Remove and submit
    Ready,
}

/// One capturable unit held by the recorded data queue
#[derive(Debug, Clone)]
pub enum QueueItem {
    Snapshot(Arc<SnapshotItem>),
    InputEvent(Arc<InputEventItem>),
    Resource(Arc<ResourceItem>),
}

impl QueueItem {
    pub fn kind(&self) -> QueueItemKind {
        match self {
            QueueItem::Snapshot(_) => QueueItemKind::Snapshot,
            QueueItem::InputEvent(_) => QueueItemKind::InputEvent,
            QueueItem::Resource(_) => QueueItemKind::Resource,
        }
    }

    pub fn context(&self) -> &RecordedQueuedItemContext {
        match self {
            QueueItem::Snapshot(item) => item.context(),
            QueueItem::InputEvent(item) => item.context(),
            QueueItem::Resource(item) => item.context(),
        }
    }

    pub fn creation_timestamp_ns(&self) -> u64 {
        match self {
            QueueItem::Snapshot(item) => item.creation_timestamp_ns(),
            QueueItem::InputEvent(item) => item.creation_timestamp_ns(),
            QueueItem::Resource(item) => item.creation_timestamp_ns(),
        }
    }

    /// Validity and readiness taken from a single observation of the item
    pub fn state(&self) -> ItemState {
        match self {
            QueueItem::Snapshot(item) => item.state(),
            QueueItem::InputEvent(_) => ItemState::Ready,
            QueueItem::Resource(item) if item.is_valid() => ItemState::Ready,
            QueueItem::Resource(_) => ItemState::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state() != ItemState::Invalid
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ItemState::Ready
    }

    /// Older than `max_delay_ns` at device time `now_ns`
    pub fn is_expired(&self, now_ns: u64, max_delay_ns: u64) -> bool {
        now_ns.saturating_sub(self.creation_timestamp_ns()) > max_delay_ns
    }
}

impl From<Arc<SnapshotItem>> for QueueItem {
    fn from(item: Arc<SnapshotItem>) -> Self {
        QueueItem::Snapshot(item)
    }
}

impl From<Arc<InputEventItem>> for QueueItem {
    fn from(item: Arc<InputEventItem>) -> Self {
        QueueItem::InputEvent(item)
    }
}

impl From<Arc<ResourceItem>> for QueueItem {
    fn from(item: Arc<ResourceItem>) -> Self {
        QueueItem::Resource(item)
    }
}
