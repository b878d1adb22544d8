//! # Session Replay Core
//!
//! Capture/consumption pipeline of a mobile session replay SDK. UI capture
//! code enqueues screen snapshots, input events and encoded resources; the
//! pipeline emits them to a downstream processor as a strictly ordered,
//! session-consistent stream.
//!
//! - Snapshots may be enqueued before tree traversal completes and may wait
//!   on asynchronous sub-tasks (resource encoding) tracked by an atomic
//!   pending-work counter
//! - The oldest item blocks emission until it is ready, expired or invalid
//! - Ready items are delivered by a single worker, so emission order equals
//!   enqueue order across all item kinds
//! - Losses (expiry, invalid captures) are reported through sampled
//!   telemetry logs and queue counters, never to the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use session_replay_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionReplayConfig::load()?;
//!     let handler = Arc::new(
//!         QueueHandler::builder()
//!             .processor(Arc::new(LoggingProcessor))
//!             .context_provider(Arc::new(StaticContextProvider::new(
//!                 SessionReplayContext::new("app", "session", "view"),
//!             )))
//!             .config(config.queue.clone())
//!             .build()?,
//!     );
//!
//!     handler.add_input_event_item(Vec::new());
//!     handler.try_to_consume_items();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod processor;
pub mod queue;
pub mod session;
pub mod telemetry;
pub mod time;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigBuilder, QueueConfig, SessionReplayConfig};
    pub use crate::error::{Result, SessionReplayError};
    pub use crate::model::{
        InputEvent, InputEventKind, Node, Orientation, ScreenBounds, SystemInformation,
    };
    pub use crate::processor::{
        CollectingProcessor, EmittedPayload, EmittedRecord, LoggingProcessor,
        RecordedDataProcessor,
    };
    pub use crate::queue::{
        DataQueueHandler, InputEventItem, NoopDataQueueHandler, QueueHandler, QueueHandlerBuilder,
        QueueItem, QueueItemKind, RecordedDataQueueRefs, ResourceItem, SnapshotItem,
        spawn_periodic_drain,
    };
    pub use crate::session::{
        RecordedQueuedItemContext, SessionContextHandler, SessionContextProvider,
        SessionReplayContext, StaticContextProvider,
    };
    pub use crate::telemetry::{QueueMetricsSnapshot, SamplingPolicy, TelemetrySampler};
    pub use crate::time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
}
