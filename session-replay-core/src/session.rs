//! Session and view identity attached to every recorded item
//!
//! Capture code never builds a queue item without a valid identity: the
//! [`SessionContextHandler`] asks the [`SessionContextProvider`] for the
//! current RUM session/view and refuses to produce a context while either is
//! unknown.

use crate::telemetry::TELEMETRY_TARGET;
use crate::time::TimeProvider;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Identity of the RUM session and view being recorded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionReplayContext {
    /// Application identifier
    pub application_id: String,
    /// RUM session identifier
    pub session_id: String,
    /// RUM view identifier
    pub view_id: String,
}

impl SessionReplayContext {
    /// Create a new context
    pub fn new(
        application_id: impl Into<String>,
        session_id: impl Into<String>,
        view_id: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            session_id: session_id.into(),
            view_id: view_id.into(),
        }
    }

    /// A context with no active session or view (nil identifiers)
    pub fn empty() -> Self {
        let nil = Uuid::nil().to_string();
        Self::new(nil.clone(), nil.clone(), nil)
    }

    /// Whether every identifier is present and not the nil UUID
    pub fn is_valid(&self) -> bool {
        [&self.application_id, &self.session_id, &self.view_id]
            .iter()
            .all(|id| is_known_id(id))
    }
}

fn is_known_id(id: &str) -> bool {
    if id.trim().is_empty() {
        return false;
    }
    match Uuid::parse_str(id) {
        Ok(uuid) => !uuid.is_nil(),
        Err(_) => true,
    }
}

/// Supplies the current session/view identity on demand
pub trait SessionContextProvider: Send + Sync {
    /// Current identity; may be [`SessionReplayContext::empty`] when no view is active
    fn current_context(&self) -> SessionReplayContext;
}

/// Provider returning a fixed identity
#[derive(Debug, Clone)]
pub struct StaticContextProvider {
    context: SessionReplayContext,
}

impl StaticContextProvider {
    /// Create a provider that always returns `context`
    pub fn new(context: SessionReplayContext) -> Self {
        Self { context }
    }
}

impl SessionContextProvider for StaticContextProvider {
    fn current_context(&self) -> SessionReplayContext {
        self.context.clone()
    }
}

/// Identity stamped on a queue item at capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedQueuedItemContext {
    /// Wall clock time of capture in milliseconds
    pub timestamp_ms: i64,
    /// Capture sequence within the current view, starting at 1
    pub document_version: u64,
    /// Session and view the item belongs to
    pub context: SessionReplayContext,
}

impl RecordedQueuedItemContext {
    /// Session identifier shortcut
    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    /// View identifier shortcut
    pub fn view_id(&self) -> &str {
        &self.context.view_id
    }
}

#[derive(Debug, Default)]
struct VersionState {
    view_id: Option<String>,
    version: u64,
}

/// Builds [`RecordedQueuedItemContext`] values from the current identity
pub struct SessionContextHandler {
    provider: Arc<dyn SessionContextProvider>,
    time_provider: Arc<dyn TimeProvider>,
    versions: Mutex<VersionState>,
}

impl SessionContextHandler {
    /// Create a handler over the given identity provider and clock
    pub fn new(
        provider: Arc<dyn SessionContextProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            provider,
            time_provider,
            versions: Mutex::new(VersionState::default()),
        }
    }

    /// Capture the current identity, or `None` when no valid session/view exists
    pub fn create_context_data(&self) -> Option<RecordedQueuedItemContext> {
        let context = self.provider.current_context();
        if !context.is_valid() {
            tracing::error!(
                target: TELEMETRY_TARGET,
                session_id = %context.session_id,
                view_id = %context.view_id,
                "Invalid session replay context, skipping capture"
            );
            return None;
        }

        let document_version = {
            let mut state = self.versions.lock().unwrap_or_else(PoisonError::into_inner);
            if state.view_id.as_deref() != Some(context.view_id.as_str()) {
                state.view_id = Some(context.view_id.clone());
                state.version = 0;
            }
            state.version += 1;
            state.version
        };

        Some(RecordedQueuedItemContext {
            timestamp_ms: self.time_provider.timestamp_ms(),
            document_version,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimeProvider;
    use std::sync::RwLock;

    struct SwitchableProvider {
        context: RwLock<SessionReplayContext>,
    }

    impl SessionContextProvider for SwitchableProvider {
        fn current_context(&self) -> SessionReplayContext {
            self.context.read().unwrap().clone()
        }
    }

    fn valid_context(view_id: &str) -> SessionReplayContext {
        SessionReplayContext::new("app", Uuid::new_v4().to_string(), view_id)
    }

    #[test]
    fn test_context_validity() {
        assert!(valid_context("view-1").is_valid());
        assert!(!SessionReplayContext::empty().is_valid());
        assert!(!SessionReplayContext::new("app", "", "view").is_valid());
        assert!(
            !SessionReplayContext::new("app", Uuid::new_v4().to_string(), Uuid::nil().to_string())
                .is_valid()
        );
    }

    #[test]
    fn test_invalid_context_yields_none() {
        let handler = SessionContextHandler::new(
            Arc::new(StaticContextProvider::new(SessionReplayContext::empty())),
            Arc::new(ManualTimeProvider::new(0)),
        );
        assert!(handler.create_context_data().is_none());
    }

    #[test]
    fn test_context_is_stamped_with_clock() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        clock.set_timestamp_ms(42);
        let context = valid_context("view-1");
        let handler = SessionContextHandler::new(
            Arc::new(StaticContextProvider::new(context.clone())),
            clock,
        );

        let data = handler.create_context_data().unwrap();
        assert_eq!(data.timestamp_ms, 42);
        assert_eq!(data.context, context);
        assert_eq!(data.view_id(), "view-1");
    }

    #[test]
    fn test_document_version_restarts_on_view_change() {
        let provider = Arc::new(SwitchableProvider {
            context: RwLock::new(valid_context("view-1")),
        });
        let handler =
            SessionContextHandler::new(provider.clone(), Arc::new(ManualTimeProvider::new(0)));

        assert_eq!(handler.create_context_data().unwrap().document_version, 1);
        assert_eq!(handler.create_context_data().unwrap().document_version, 2);

        *provider.context.write().unwrap() = valid_context("view-2");
        assert_eq!(handler.create_context_data().unwrap().document_version, 1);
        assert_eq!(handler.create_context_data().unwrap().document_version, 2);
    }
}
