//! Calculator Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    #[error("Repository error: {message}")]
    Repository { message: String },

    #[error("Git operation failed: {message}")]
    Git { message: String },

    #[error("Invalid calculator configuration: {message}")]
    Configuration { message: String },
}

impl ContextualError for CalculatorError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, CalculatorError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CalculatorError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for calculator operations
pub type CalculatorResult<T> = Result<T, CalculatorError>;
