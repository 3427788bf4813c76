//! Error types for event routing.

use thiserror::Error;

/// Returned by the router when a dispatched handler fails.
///
/// The router never interprets handler failures; it hands them back to the
/// caller untouched, after the listener's exception hook has seen them.
/// Registry, cooldown and usage state are unaffected by a failing handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A command, help or structured-command handler returned an error.
    #[error("handler for '{command}' failed: {source}")]
    Handler {
        /// Name of the command (or help word) whose handler failed.
        command: String,
        /// The handler's own error.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Wraps a handler error for the named command.
    pub fn handler(command: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            command: command.into(),
            source,
        }
    }

    /// Returns the name of the command whose handler failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Handler { command, .. } => command,
        }
    }
}

/// Result type for routing operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
