//! # Peersync Chain
//!
//! The external contracts the sync engine is written against:
//!
//! - [`ChainView`] - chain statistics and paginated hash/block retrieval.
//!   Consumed twice per synchronizer: once for the local chain (durable,
//!   fast, assumed reliable) and once for the remote peer (network-backed,
//!   may fail or time out).
//! - [`FinalizedHeightSupplier`] - the current immutable floor height.
//! - [`BlockRangeConsumer`] - the downstream processing pipeline pulled
//!   block ranges are submitted to.
//!
//! [`MemoryChain`] is the reference `ChainView` implementation, used by
//! tests and by the testkit.

pub mod consumer;
pub mod error;
pub mod memory;
pub mod view;

pub use consumer::{BlockRangeConsumer, CompletionHandler, CompletionStatus, ElementId};
pub use error::{ChainError, Result};
pub use memory::MemoryChain;
pub use view::{BlockReadOptions, ChainView, FinalizedHeightSupplier};
