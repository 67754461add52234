//! Error types for the sync engine.

use peersync_chain::ChainError;
use thiserror::Error;

/// Errors that abort a synchronization attempt.
///
/// Which side failed matters: a local view failure is a node-side fault,
/// a remote one is charged to the peer. Neither is ever reinterpreted as a
/// comparison outcome.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local chain view failed.
    #[error("local chain view error: {0}")]
    Local(#[source] ChainError),

    /// The remote chain view failed (timeout, disconnect).
    #[error("remote chain view error: {0}")]
    Remote(#[source] ChainError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;
