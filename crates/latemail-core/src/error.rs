//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value could not be used.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The user's home directory is unknown.
    #[error("Could not determine the home directory")]
    HomeDirectory,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
