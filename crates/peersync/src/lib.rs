//! # Peersync
//!
//! Chain comparison & synchronization against a single remote peer: decide
//! whether the peer's chain view is ahead of the local one, locate the
//! highest block both agree on, and pull the diverging blocks under a
//! byte/count budget into a downstream processing pipeline.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peersync::{
//!     ChainSynchronizer, ComparisonOptions, Height, PeerId, SynchronizerConfig,
//! };
//!
//! async fn example(
//!     local: Arc<dyn peersync::ChainView>,
//!     remote: &dyn peersync::ChainView,
//!     consumer: Arc<dyn peersync::BlockRangeConsumer>,
//! ) {
//!     let options = ComparisonOptions::new(1000, Arc::new(|| Height::new(1)));
//!     let sync = ChainSynchronizer::new(local, consumer, options, SynchronizerConfig::default());
//!
//!     // Driven by an external periodic trigger:
//!     let verdict = sync.synchronize(PeerId::random(), remote).await;
//!     let _ = verdict; // feed to peer reputation
//! }
//! ```
//!
//! ## Division of labor
//!
//! Transport, wire codecs, block validation, storage, reputation policy, and
//! scheduling are all external collaborators; see the `peersync-chain` crate
//! for the consumed contracts and `peersync-engine` for the machinery.

pub use peersync_core::{
    Block, BlockHash, BlockHeader, BlockRange, ChainScore, ChainStatistics, Height, PeerId,
};

pub use peersync_chain::{
    BlockRangeConsumer, BlockReadOptions, ChainError, ChainView, CompletionHandler,
    CompletionStatus, ElementId, FinalizedHeightSupplier, MemoryChain,
};

pub use peersync_engine::{
    ChainComparer, ChainSynchronizer, ComparisonCode, ComparisonOptions, ComparisonOutcome,
    NodeInteractionVerdict, RangeAggregator, SyncError, SynchronizerConfig, UnprocessedRanges,
    VerdictPolicy,
};
