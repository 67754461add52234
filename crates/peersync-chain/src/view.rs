//! The chain view contract.
//!
//! A `ChainView` exposes one chain's statistics and paginated hash/block
//! retrieval. The sync engine consumes two of them per attempt: the local
//! view and one remote peer's view.

use async_trait::async_trait;
use peersync_core::{Block, BlockHash, ChainStatistics, Height};

use crate::error::Result;

/// Budget for one `blocks_from` page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReadOptions {
    /// Maximum number of blocks in the page.
    pub max_count: u32,
    /// Maximum total canonical encoded size of the page.
    pub max_bytes: u64,
}

/// Read access to one chain, local or remote.
///
/// Implementations must be thread-safe (Send + Sync). Remote-backed
/// implementations surface transport failures through [`ChainError`];
/// the local view is assumed reliable.
///
/// [`ChainError`]: crate::error::ChainError
#[async_trait]
pub trait ChainView: Send + Sync {
    /// Current chain statistics (tip height and cumulative score).
    async fn statistics(&self) -> Result<ChainStatistics>;

    /// Up to `max_count` block hashes starting at `start`, ascending.
    ///
    /// Returns fewer than `max_count` at the chain end. A remote peer
    /// returning more than `max_count` is a protocol violation, detected
    /// by the caller rather than here.
    async fn hashes_from(&self, start: Height, max_count: u32) -> Result<Vec<BlockHash>>;

    /// An ordered block page starting at `start`, bounded by `options`.
    ///
    /// May be shorter than the bounds or empty at the chain end. If a block
    /// exists at `start`, the page carries at least that block, even when
    /// it alone exceeds `max_bytes`; a page must always make progress.
    async fn blocks_from(&self, start: Height, options: BlockReadOptions) -> Result<Vec<Block>>;
}

/// Supplies the current finalized height: the floor below which history is
/// treated as immutable.
pub trait FinalizedHeightSupplier: Send + Sync {
    /// The current immutable floor height.
    fn finalized_height(&self) -> Height;
}

impl<F> FinalizedHeightSupplier for F
where
    F: Fn() -> Height + Send + Sync,
{
    fn finalized_height(&self) -> Height {
        self()
    }
}
