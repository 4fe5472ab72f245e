//! Error types for the menu runtime.

use thiserror::Error;

/// Errors surfaced by the menu runtime to its callers.
///
/// Handler failures never show up here: the event manager logs them and keeps
/// dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("Could not find a menu registered under id: {0}")]
    NotRegistered(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Missing context value: {0}")]
    MissingContextValue(String),

    #[error("Opening menu '{menu_id}' was cancelled by a listener")]
    OpenCancelled { menu_id: String },

    #[error("Session was dropped before it opened")]
    SessionDropped,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MenuError {
    pub fn precondition(message: impl Into<String>) -> Self {
        MenuError::Precondition(message.into())
    }

    /// Short message suitable for showing to the acting user.
    pub fn user_message(&self, menu_id: &str) -> String {
        match self {
            MenuError::NotRegistered(_) => format!("Menu '{}' is not available.", menu_id),
            other => format!("Could not open menu '{}': {}", menu_id, other),
        }
    }
}

impl From<config::ConfigError> for MenuError {
    fn from(err: config::ConfigError) -> Self {
        MenuError::Config(err.to_string())
    }
}
