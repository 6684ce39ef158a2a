//! Error types for the Floodgate limiter.

use thiserror::Error;

/// Main error type for Floodgate operations.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// Policy configuration errors, raised once at load time
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared store command or connection errors
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Shared store unreachable; carries the underlying cause as text.
    ///
    /// Constructible without a live client, so tests can hand a limiter a
    /// store that fails on demand.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
