//! Vocabulary loading errors

use thiserror::Error;

/// Errors raised while building a [`Vocabulary`](crate::Vocabulary)
#[derive(Error, Debug)]
pub enum VocabularyError {
    /// The piece table or its markers are malformed
    #[error("invalid vocabulary format: {reason}")]
    Format {
        /// What was wrong with the input
        reason: String,
    },

    /// The vocabulary source could not be read
    #[error("I/O error reading vocabulary: {0}")]
    Io(#[from] std::io::Error),
}

impl VocabularyError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        VocabularyError::Format {
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for VocabularyError {
    fn from(err: serde_json::Error) -> Self {
        VocabularyError::format(err.to_string())
    }
}

/// Result type for vocabulary operations
pub type Result<T> = std::result::Result<T, VocabularyError>;
