//! # Peersync Engine
//!
//! The chain comparison & synchronization engine of a node's peer-sync
//! subsystem. Relative to a single remote peer it decides whether the peer's
//! chain is ahead of the local one, locates the highest block both agree on,
//! and, when justified, pulls block batches under a byte/count budget and
//! submits them to the downstream processing pipeline.
//!
//! ## Components
//!
//! - [`ChainComparer`] - one multi-round async comparison of two chain views
//! - [`RangeAggregator`] - accumulates pulled batches into one ordered range
//! - [`UnprocessedRanges`] - bounded FIFO of submitted-but-incomplete ranges
//! - [`ChainSynchronizer`] - orchestrates one synchronization attempt per tick
//! - [`VerdictPolicy`] - maps comparison codes to reputation verdicts
//!
//! ## What this is not
//!
//! Not a consensus algorithm: block validity is never decided here, only
//! reconciliation of two already-available chain views and the transfer of
//! the diverging blocks. Transport, storage, validation, reputation, and
//! scheduling all live with the embedding node.

pub mod aggregator;
pub mod comparer;
pub mod error;
pub mod synchronizer;
pub mod unprocessed;
pub mod verdict;

pub use aggregator::RangeAggregator;
pub use comparer::{ChainComparer, ComparisonCode, ComparisonOptions, ComparisonOutcome};
pub use error::{Result, SyncError};
pub use synchronizer::{ChainSynchronizer, SynchronizerConfig};
pub use unprocessed::UnprocessedRanges;
pub use verdict::{NodeInteractionVerdict, VerdictPolicy};
