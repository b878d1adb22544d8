//! Error types for session replay operations

/// Result type for session replay operations
pub type Result<T> = std::result::Result<T, SessionReplayError>;

/// Error types for the session replay pipeline
#[derive(Debug, thiserror::Error)]
pub enum SessionReplayError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The recorded data queue could not be accessed (poisoned lock)
    #[error("Recorded data queue unavailable: {0}")]
    QueueUnavailable(String),

    /// An item was submitted after the executor was stopped
    #[error("Executor has been shut down")]
    ExecutorShutdown,

    /// Downstream processor failure
    #[error("Processor error: {0}")]
    Processor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SessionReplayError::ExecutorShutdown.to_string(),
            "Executor has been shut down"
        );
        assert_eq!(
            SessionReplayError::Configuration("missing processor".to_string()).to_string(),
            "Configuration error: missing processor"
        );
    }
}
