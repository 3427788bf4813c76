//! Runtime error types.

use thiserror::Error;

use herald_core::RegistryError;

use crate::config::ConfigError;

/// Errors that can occur while building or running a [`CommandClient`].
///
/// [`CommandClient`]: crate::CommandClient
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The initial commands could not be registered.
    #[error("Failed to register commands: {0}")]
    Registry(#[from] RegistryError),

    /// `start` was called on a client whose sweeper is already running.
    #[error("Client is already running")]
    AlreadyRunning,

    /// `start` was called after `shutdown`.
    #[error("Client has been shut down")]
    ShutDown,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
