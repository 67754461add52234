//! # Peersync Core
//!
//! Pure primitives for the peersync engine: heights, chain scores, blocks,
//! and canonicalization.
//!
//! This crate contains no I/O, no networking, no locking. It is pure
//! computation over chain data structures.
//!
//! ## Key Types
//!
//! - [`Height`] - 1-based position of a block in a chain
//! - [`ChainScore`] - totally ordered weight ranking competing chains
//! - [`Block`] / [`BlockHeader`] - the unit of synchronization
//! - [`BlockRange`] - an ordered run of blocks pulled from one remote source
//! - [`ChainStatistics`] - the (height, score) summary of a chain view
//!
//! ## Canonicalization
//!
//! Blocks are encoded using deterministic CBOR. See [`canonical`]. The
//! canonical bytes drive both block hashing and byte-size accounting.

pub mod block;
pub mod canonical;
pub mod hash;
pub mod types;

pub use block::{Block, BlockHeader, BlockRange};
pub use canonical::{block_bytes, header_bytes};
pub use hash::BlockHash;
pub use types::{ChainScore, ChainStatistics, Height, PeerId};
