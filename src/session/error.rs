//! Session Error Types

use crate::calculator::CalculatorError;
use crate::config::ConfigError;
use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Version calculation failed: {0}")]
    Calculator(#[from] CalculatorError),

    /// `fail_if_dirty` policy violation, raised before any descriptor mutation
    #[error("repository is dirty")]
    DirtyRepository,

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Cannot serialize session state: {message}")]
    Serialization { message: String },

    #[error("Cannot write properties to file '{path}': {message}")]
    PropertiesExport { path: String, message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ContextualError for SessionError {
    fn is_user_actionable(&self) -> bool {
        match self {
            SessionError::Configuration(e) => e.is_user_actionable(),
            SessionError::Calculator(e) => e.is_user_actionable(),
            SessionError::DirtyRepository => true,
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SessionError::Configuration(e) => e.user_message(),
            SessionError::Calculator(e) => e.user_message(),
            SessionError::DirtyRepository => Some("repository is dirty"),
            _ => None,
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
