//! Error types for action and provider operations
//!
//! This module defines the error type shared by the action registry and the
//! dynamic action providers. Errors are `Clone` so a single refresh failure can
//! be handed to every caller that was waiting on it.

use crate::action::ActionType;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by provider fetch functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for action operations
#[derive(Error, Debug, Clone)]
pub enum ActionError {
    /// The provider's fetch function failed
    #[error("Fetch error in dynamic action provider '{provider}': {source}")]
    FetchError {
        provider: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The background refresh task ended without producing a result
    #[error("Refresh aborted for dynamic action provider '{provider}': {reason}")]
    RefreshAborted { provider: String, reason: String },

    /// No action registered or provided under this key
    #[error("Action not found: /{action_type}/{name}")]
    NotFound { action_type: ActionType, name: String },

    /// An action handler returned an error
    #[error("Action '{action}' failed: {message}")]
    HandlerError { action: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for action operations
pub type Result<T> = std::result::Result<T, ActionError>;

impl ActionError {
    /// Wrap a fetch failure for the named provider
    pub fn fetch(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        let source: BoxError = source.into();
        ActionError::FetchError {
            provider: provider.into(),
            source: Arc::from(source),
        }
    }

    /// Build a handler error for the named action
    pub fn handler(action: impl Into<String>, message: impl Into<String>) -> Self {
        ActionError::HandlerError {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Convert to HTTP status code equivalent
    pub fn to_http_status_code(&self) -> u16 {
        match self {
            ActionError::NotFound { .. } => 404,
            ActionError::ConfigError(_) | ActionError::SerializationError(_) => 400,
            ActionError::FetchError { .. } | ActionError::RefreshAborted { .. } => 503,
            ActionError::HandlerError { .. } | ActionError::Other(_) => 500,
        }
    }
}

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError::Other(s)
    }
}

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        ActionError::SerializationError(e.to_string())
    }
}
