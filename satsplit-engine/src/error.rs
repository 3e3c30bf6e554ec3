//! Engine error types
//!
//! Construction failures surface directly. Per-call failures are wrapped in
//! [`EngineError::Stage`] so callers can tell which step of the pipeline
//! failed while still matching on the underlying cause.

use satsplit_tokenizer::VocabularyError;
use std::fmt;
use thiserror::Error;

/// Pipeline step a per-call error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Creating sessions for the pool
    Construct,
    /// Waiting for a pooled session
    Acquire,
    /// Running the scoring backend over a window
    Score,
    /// Merging per-window logits
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Construct => "construct",
            Stage::Acquire => "acquire",
            Stage::Score => "score",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// Failure reported by a scoring backend
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl BackendError {
    /// Create a backend error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping an underlying cause
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message without its cause chain
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Vocabulary could not be loaded
    #[error("vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Scoring backend failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session pool has been closed
    #[error("session pool is closed")]
    PoolClosed,

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Caller deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Backend returned the wrong number of logits for a window
    #[error("backend returned {actual} logits for a window of {expected} tokens")]
    LogitCountMismatch {
        /// Tokens in the window
        expected: usize,
        /// Logits returned
        actual: usize,
    },

    /// Native runtime could not be brought up
    #[error("runtime initialization failed: {0}")]
    Runtime(String),

    /// Configuration error
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Gold corpus file could not be parsed
    #[error("invalid corpus: {0}")]
    Corpus(String),

    /// Error raised in a specific pipeline stage
    #[error("{stage} failed: {source}")]
    Stage {
        /// Stage that failed
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach the failing stage to this error
    ///
    /// Errors already carrying a stage keep the innermost one.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            err @ EngineError::Stage { .. } => err,
            err => EngineError::Stage {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// Stage the error was raised in, if known
    pub fn stage(&self) -> Option<Stage> {
        match self {
            EngineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error with any stage wrapping removed
    pub fn root_cause(&self) -> &EngineError {
        match self {
            EngineError::Stage { source, .. } => source.root_cause(),
            err => err,
        }
    }

    /// Whether the error came from cancellation or a passed deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.root_cause(),
            EngineError::Cancelled | EngineError::DeadlineExceeded
        )
    }

    /// Whether the error came from a closed pool
    pub fn is_pool_closed(&self) -> bool {
        matches!(self.root_cause(), EngineError::PoolClosed)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Corpus(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_wrapping_keeps_innermost() {
        let err = EngineError::Cancelled
            .in_stage(Stage::Score)
            .in_stage(Stage::Acquire);
        assert_eq!(err.stage(), Some(Stage::Score));
        assert!(err.is_cancellation());
        assert_eq!(err.to_string(), "score failed: operation cancelled");
    }

    #[test]
    fn test_cancellation_is_distinct_from_backend_errors() {
        let backend: EngineError = BackendError::new("kernel crashed").into();
        assert!(!backend.in_stage(Stage::Score).is_cancellation());
        assert!(EngineError::DeadlineExceeded.is_cancellation());
        assert!(!EngineError::PoolClosed.is_cancellation());
        assert!(EngineError::PoolClosed
            .in_stage(Stage::Acquire)
            .is_pool_closed());
    }

    #[test]
    fn test_backend_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "device lost");
        let err = BackendError::with_source("run failed", io);
        assert_eq!(err.message(), "run failed");
        assert_eq!(err.source().unwrap().to_string(), "device lost");
    }
}
