//! Session replay capture queue
//!
//! Capture code enqueues snapshots, input events and resources; a drain pass
//! forwards them to the processor strictly in enqueue order.
//!
//! # Architecture
//!
//! - [`QueueItem`]: closed set of item kinds with validity/readiness rules
//! - [`OrderedQueue`]: FIFO with head-only access
//! - [`QueueHandler`]: head-of-line drain loop under a single drain lock
//! - [`SerialExecutor`]: one worker delivering items to the processor
//! - [`RecordedDataQueueRefs`]: pending-work handle for asynchronous sub-tasks
//!
//! # Example
//!
//! ```rust,no_run
//! use session_replay_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let handler = Arc::new(
//!     QueueHandler::builder()
//!         .processor(Arc::new(LoggingProcessor))
//!         .context_provider(Arc::new(StaticContextProvider::new(
//!             SessionReplayContext::new("app", "session", "view"),
//!         )))
//!         .build()?,
//! );
//!
//! if let Some(snapshot) = handler.add_snapshot_item(SystemInformation::default()) {
//!     let refs = RecordedDataQueueRefs::new(&handler, &snapshot);
//!     refs.increment_pending_jobs();
//!     snapshot.finish_traversal(vec![Node::new(1, "image")]);
//!     // ... resource encoding completes on another thread
//!     refs.decrement_pending_jobs();
//! }
//! # Ok(())
//! # }
//! ```

mod executor;
mod handler;
mod item;
mod ordered;
mod refs;
mod ticker;

pub use executor::SerialExecutor;
pub use handler::{
    DataQueueHandler, FAILED_TO_ADD_RECORDS_TO_QUEUE_ERROR_MESSAGE, ITEM_DROPPED_EXPIRED_MESSAGE,
    ITEM_DROPPED_INVALID_MESSAGE, NoopDataQueueHandler, QueueHandler, QueueHandlerBuilder,
};
pub use item::{InputEventItem, ItemState, QueueItem, QueueItemKind, ResourceItem, SnapshotItem};
pub use ordered::OrderedQueue;
pub use refs::RecordedDataQueueRefs;
pub use ticker::spawn_periodic_drain;
