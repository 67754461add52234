//! In-memory implementation of the ChainView trait.
//!
//! This is primarily for testing. It behaves like a well-formed peer: pages
//! honor their bounds and shorten at the chain end. Misbehaving peers are
//! modeled separately (see the testkit's scripted view).

use std::sync::RwLock;

use async_trait::async_trait;
use peersync_core::{Block, BlockHash, ChainScore, ChainStatistics, Height};

use crate::error::Result;
use crate::view::{BlockReadOptions, ChainView};

/// In-memory chain: a block vector behind an RwLock.
///
/// Heights are 1-based; block `n` lives at index `n - 1`. Mutators exist so
/// tests can grow, truncate, and re-score the chain between sync rounds.
pub struct MemoryChain {
    inner: RwLock<MemoryChainInner>,
}

struct MemoryChainInner {
    blocks: Vec<StoredBlock>,
    score: ChainScore,
}

struct StoredBlock {
    block: Block,
    hash: BlockHash,
}

impl MemoryChain {
    /// Create a new empty chain with zero score.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryChainInner {
                blocks: Vec::new(),
                score: ChainScore::ZERO,
            }),
        }
    }

    /// Create a chain from blocks already in ascending height order.
    pub fn from_blocks(blocks: Vec<Block>, score: ChainScore) -> Self {
        let chain = Self::new();
        {
            let mut inner = chain.inner.write().unwrap();
            inner.score = score;
            for block in blocks {
                let hash = block.hash();
                inner.blocks.push(StoredBlock { block, hash });
            }
        }
        chain
    }

    /// Append a block at the tip.
    pub fn push(&self, block: Block) {
        let mut inner = self.inner.write().unwrap();
        debug_assert_eq!(
            block.height().value(),
            inner.blocks.len() as u64 + 1,
            "blocks must be pushed in height order"
        );
        let hash = block.hash();
        inner.blocks.push(StoredBlock { block, hash });
    }

    /// Drop all blocks above `height`. Used to model a local reorg racing
    /// an in-flight comparison round.
    pub fn truncate(&self, height: Height) {
        let mut inner = self.inner.write().unwrap();
        inner.blocks.truncate(height.value() as usize);
    }

    /// Set the chain score.
    pub fn set_score(&self, score: ChainScore) {
        self.inner.write().unwrap().score = score;
    }

    /// Current tip height ([`Height::ZERO`] when empty).
    pub fn height(&self) -> Height {
        Height::new(self.inner.read().unwrap().blocks.len() as u64)
    }

    /// Current chain score.
    pub fn score(&self) -> ChainScore {
        self.inner.read().unwrap().score
    }

    /// Hash of the block at `height`, if present.
    pub fn hash_at(&self, height: Height) -> Option<BlockHash> {
        let inner = self.inner.read().unwrap();
        index_of(height).and_then(|i| inner.blocks.get(i).map(|s| s.hash))
    }

    /// The block at `height`, if present.
    pub fn block_at(&self, height: Height) -> Option<Block> {
        let inner = self.inner.read().unwrap();
        index_of(height).and_then(|i| inner.blocks.get(i).map(|s| s.block.clone()))
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

fn index_of(height: Height) -> Option<usize> {
    if height.is_zero() {
        None
    } else {
        Some(height.value() as usize - 1)
    }
}

#[async_trait]
impl ChainView for MemoryChain {
    async fn statistics(&self) -> Result<ChainStatistics> {
        let inner = self.inner.read().unwrap();
        Ok(ChainStatistics::new(
            Height::new(inner.blocks.len() as u64),
            inner.score,
        ))
    }

    async fn hashes_from(&self, start: Height, max_count: u32) -> Result<Vec<BlockHash>> {
        let inner = self.inner.read().unwrap();
        let Some(first) = index_of(start) else {
            return Ok(Vec::new());
        };
        Ok(inner
            .blocks
            .iter()
            .skip(first)
            .take(max_count as usize)
            .map(|s| s.hash)
            .collect())
    }

    async fn blocks_from(&self, start: Height, options: BlockReadOptions) -> Result<Vec<Block>> {
        let inner = self.inner.read().unwrap();
        let Some(first) = index_of(start) else {
            return Ok(Vec::new());
        };

        let mut page = Vec::new();
        let mut total_bytes = 0u64;
        for stored in inner.blocks.iter().skip(first) {
            if page.len() >= options.max_count as usize {
                break;
            }
            let size = stored.block.encoded_size();
            // The first block always ships, even if it alone busts the
            // byte budget; a page must make progress.
            if !page.is_empty() && total_bytes + size > options.max_bytes {
                break;
            }
            total_bytes += size;
            page.push(stored.block.clone());
        }
        Ok(page)
    }
}
