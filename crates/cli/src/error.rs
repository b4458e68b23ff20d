//! CLI error types.

use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// An error occurred in the relation registry.
    #[error(transparent)]
    Relations(#[from] relations::Error),

    /// An error occurred in the policy store.
    #[error(transparent)]
    Privacy(#[from] privacy::Error),

    /// An error occurred while deciding access.
    #[error(transparent)]
    Access(#[from] access::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
