//! Error types for registry mutation.

use thiserror::Error;

/// Errors returned when mutating a [`CommandRegistry`](crate::CommandRegistry).
///
/// Every variant leaves the registry exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The insert position lies outside `[0, len]`.
    #[error("index specified is invalid: [{index}/{len}]")]
    InvalidIndex {
        /// The requested position.
        index: usize,
        /// The registry length at the time of the call.
        len: usize,
    },

    /// The command's name or one of its aliases is already indexed.
    #[error("command has a name or alias that has already been indexed: \"{0}\"")]
    DuplicateKey(String),

    /// No command owns the given name or alias.
    #[error("name provided is not indexed: \"{0}\"")]
    NotFound(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
