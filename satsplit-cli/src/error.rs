//! Error handling for the CLI application

use std::fmt;

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// No pattern matched a readable file
    NoInputFiles(String),
    /// Invalid file pattern
    InvalidPattern(String),
    /// Configuration error
    ConfigError(String),
    /// Command was given nothing to work on
    MissingInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NoInputFiles(patterns) => write!(f, "No files found matching: {patterns}"),
            CliError::InvalidPattern(pattern) => write!(f, "Invalid file pattern: {pattern}"),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::MissingInput(msg) => write!(f, "Missing input: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CliError::NoInputFiles("*.txt".to_string()).to_string(),
            "No files found matching: *.txt"
        );
        assert_eq!(
            CliError::InvalidPattern("[invalid".to_string()).to_string(),
            "Invalid file pattern: [invalid"
        );
        assert_eq!(
            CliError::ConfigError("bad threshold".to_string()).to_string(),
            "Configuration error: bad threshold"
        );
        assert_eq!(
            CliError::MissingInput("no text".to_string()).to_string(),
            "Missing input: no text"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = CliError::MissingInput("gold file".to_string()).into();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingInput(_))
        ));
    }
}
