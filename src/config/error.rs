//! Configuration Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Malformed configuration in '{path}': {message}")]
    Malformed { path: String, message: String },

    #[error("Invalid configuration value: {message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        // Configuration problems are always fixable by the user
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Io { message, .. } => Some(message),
            ConfigError::Malformed { message, .. } => Some(message),
            ConfigError::Invalid { message } => Some(message),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
