//! Descriptor Error Types

use crate::core::error_handling::ContextualError;
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// Canonical-path resolution or other I/O failure during a descriptor
    /// read; fatal for that read, never retried
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Cannot read descriptor '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Cannot write descriptor '{path}': {message}")]
    Write { path: String, message: String },

    /// Session-state serialization failures surface as I/O-class errors
    #[error("Cannot serialize session state: {message}")]
    Serialization { message: String },
}

impl From<std::io::Error> for DescriptorError {
    fn from(e: std::io::Error) -> Self {
        DescriptorError::Io {
            message: e.to_string(),
        }
    }
}

impl From<SessionError> for DescriptorError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Serialization { message } => DescriptorError::Serialization { message },
            other => DescriptorError::Io {
                message: other.to_string(),
            },
        }
    }
}

impl ContextualError for DescriptorError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;
