//! Error types for chain views.

use peersync_core::Height;
use thiserror::Error;

/// Errors a [`ChainView`](crate::view::ChainView) can surface.
///
/// For a remote view these are transport failures; the sync engine aborts
/// the round and reports them without reinterpreting partial data.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The underlying connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A read past the view's current tip that the view cannot serve.
    #[error("height out of range: {0}")]
    HeightOutOfRange(Height),
}

/// Result type for chain view operations.
pub type Result<T> = std::result::Result<T, ChainError>;
