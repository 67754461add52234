//! Blocks and block ranges: the units of synchronization.
//!
//! Block payloads are opaque bytes. Content validation and execution happen
//! downstream of the sync engine; here a block only needs a height, a parent
//! link, and a measurable wire size.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::block_bytes;
use crate::hash::BlockHash;
use crate::types::{Height, PeerId};

/// Header of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Position in the chain (1-based).
    pub height: Height,
    /// Hash of the parent block ([`BlockHash::ZERO`] for genesis).
    pub parent: BlockHash,
    /// Block timestamp in Unix milliseconds.
    pub timestamp: i64,
}

/// A block: header plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Opaque payload; interpreted downstream, never here.
    pub payload: Bytes,
}

impl Block {
    /// Create a new block.
    pub fn new(header: BlockHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// The block's height.
    pub fn height(&self) -> Height {
        self.header.height
    }

    /// The block's content hash over its canonical bytes.
    pub fn hash(&self) -> BlockHash {
        BlockHash::of_block_bytes(&block_bytes(self))
    }

    /// Canonical encoded size in bytes, the unit of all byte budgets.
    pub fn encoded_size(&self) -> u64 {
        block_bytes(self).len() as u64
    }
}

/// An ordered, height-contiguous run of blocks pulled from one remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    source: PeerId,
    blocks: Vec<Block>,
}

impl BlockRange {
    /// Create a range tagged with the source it was pulled from.
    pub fn new(source: PeerId, blocks: Vec<Block>) -> Self {
        Self { source, blocks }
    }

    /// The remote source the blocks came from.
    pub fn source(&self) -> PeerId {
        self.source
    }

    /// The blocks, in ascending height order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consume the range, yielding its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when the range holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Height of the first block, or [`Height::ZERO`] when empty.
    pub fn start_height(&self) -> Height {
        self.blocks.first().map_or(Height::ZERO, Block::height)
    }

    /// Height of the last block, or [`Height::ZERO`] when empty.
    pub fn end_height(&self) -> Height {
        self.blocks.last().map_or(Height::ZERO, Block::height)
    }

    /// Total canonical encoded size of all blocks.
    pub fn byte_size(&self) -> u64 {
        self.blocks.iter().map(Block::encoded_size).sum()
    }
}
