//! Error types for the Polyglot core library
//!
//! This module defines the error handling system for Polyglot, using
//! thiserror for the error enum and anyhow for boxed error sources.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Polyglot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Model configuration could not be parsed or validated
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A model resource (translation table, vocabulary) could not be read
    #[error("Resource error: {} - {message}", path.display())]
    Resource {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid arguments passed to a service call
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
    },

    /// The engine failed while translating an input
    #[error("Translation failed: {message}")]
    Translation {
        message: String,
        context: Option<String>,
    },

    /// A batch was cancelled before it completed
    #[error("Translation cancelled after {completed} of {total} inputs")]
    Cancelled { completed: usize, total: usize },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error for a named argument
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a translation error
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
            context: None,
        }
    }

    /// Whether this error was raised while loading a model
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Resource { .. })
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration {
            message: format!("invalid model options: {}", err),
            source: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("options", "expected 2 entries, got 1");
        assert_eq!(
            err.to_string(),
            "Validation error: options - expected 2 entries, got 1"
        );

        let err = Error::Cancelled { completed: 3, total: 10 };
        assert!(err.to_string().contains("3 of 10"));
    }

    #[test]
    fn test_yaml_error_is_configuration() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: b: c").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(err.is_configuration());
        assert!(std::error::Error::source(&err).is_some());
    }
}
