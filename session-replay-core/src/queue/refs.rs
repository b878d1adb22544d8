//! Handle given to asynchronous sub-tasks of a snapshot

use crate::queue::handler::DataQueueHandler;
use crate::queue::item::SnapshotItem;
use std::sync::{Arc, Weak};

/// Weak references to a snapshot and its handler.
///
/// A resource-encoding task calls
/// [`increment_pending_jobs`](Self::increment_pending_jobs) before it starts
/// and [`decrement_pending_jobs`](Self::decrement_pending_jobs) when it
/// completes; the decrement immediately triggers a drain pass. When the
/// snapshot or the handler has already been dropped, every call is a no-op.
#[derive(Clone)]
pub struct RecordedDataQueueRefs {
    handler: Weak<dyn DataQueueHandler>,
    item: Weak<SnapshotItem>,
}

impl RecordedDataQueueRefs {
    pub fn new<H: DataQueueHandler + 'static>(handler: &Arc<H>, item: &Arc<SnapshotItem>) -> Self {
        let handler: Weak<H> = Arc::downgrade(handler);
        let handler: Weak<dyn DataQueueHandler> = handler;
        Self {
            handler,
            item: Arc::downgrade(item),
        }
    }

    pub fn increment_pending_jobs(&self) {
        if let Some(item) = self.item.upgrade() {
            item.increment_pending_jobs();
        }
    }

    /// Complete one sub-task and re-check the queue
    pub fn decrement_pending_jobs(&self) {
        if let Some(item) = self.item.upgrade() {
            let remaining = item.decrement_pending_jobs();
            tracing::trace!(pending_jobs = remaining, "Snapshot sub-task completed");
        }
        self.try_to_consume_items();
    }

    pub fn try_to_consume_items(&self) {
        if let Some(handler) = self.handler.upgrade() {
            handler.try_to_consume_items();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputEvent, SystemInformation};
    use crate::queue::handler::NoopDataQueueHandler;
    use crate::queue::item::{InputEventItem, ResourceItem};
    use crate::session::{RecordedQueuedItemContext, SessionReplayContext};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        drains: AtomicUsize,
    }

    impl DataQueueHandler for CountingHandler {
        fn add_snapshot_item(&self, _: SystemInformation) -> Option<Arc<SnapshotItem>> {
            None
        }

        fn add_input_event_item(&self, _: Vec<InputEvent>) -> Option<Arc<InputEventItem>> {
            None
        }

        fn add_resource_item(&self, _: String, _: Vec<u8>) -> Option<Arc<ResourceItem>> {
            None
        }

        fn try_to_consume_items(&self) {
            self.drains.fetch_add(1, Ordering::Relaxed);
        }

        fn clear_and_stop_processing_queue(&self) {}
    }

    fn snapshot() -> Arc<SnapshotItem> {
        let context = RecordedQueuedItemContext {
            timestamp_ms: 0,
            document_version: 1,
            context: SessionReplayContext::new("app", "session", "view"),
        };
        Arc::new(SnapshotItem::new(context, SystemInformation::default(), 0))
    }

    #[test]
    fn test_refs_from_concrete_handler_types() {
        let item = snapshot();
        let counting = Arc::new(CountingHandler::default());
        let refs = RecordedDataQueueRefs::new(&counting, &item);
        let noop_refs = RecordedDataQueueRefs::new(&Arc::new(NoopDataQueueHandler), &item);

        refs.increment_pending_jobs();
        assert_eq!(item.pending_jobs(), 1);
        refs.decrement_pending_jobs();
        assert_eq!(item.pending_jobs(), 0);
        assert_eq!(counting.drains.load(Ordering::Relaxed), 1);

        // the temporary noop handler is already gone
        noop_refs.increment_pending_jobs();
        noop_refs.decrement_pending_jobs();
        assert_eq!(item.pending_jobs(), 0);
    }

    #[test]
    fn test_refs_outlive_snapshot() {
        let counting = Arc::new(CountingHandler::default());
        let item = snapshot();
        let refs = RecordedDataQueueRefs::new(&counting, &item);
        drop(item);

        refs.increment_pending_jobs();
        refs.decrement_pending_jobs();
        assert_eq!(counting.drains.load(Ordering::Relaxed), 1);
    }
}
