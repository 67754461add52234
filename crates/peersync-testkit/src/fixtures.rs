//! Deterministic chain fixtures.
//!
//! Blocks are fully determined by (height, parent, seed), so two fixtures
//! built from the same inputs agree hash-for-hash and fixtures built with
//! different seeds diverge at every block.

use peersync_core::{Block, BlockHash, BlockHeader, ChainScore, Height};
use peersync_chain::MemoryChain;

/// Base timestamp for fixture blocks (arbitrary but fixed).
const BASE_TIMESTAMP: i64 = 1_700_000_000_000;

/// Build one block with a payload derived from its height and seed.
pub fn make_block(height: Height, parent: BlockHash, seed: u8) -> Block {
    let mut payload = vec![seed; 24];
    payload.extend_from_slice(&height.value().to_le_bytes());
    Block::new(
        BlockHeader {
            height,
            parent,
            timestamp: BASE_TIMESTAMP + height.value() as i64,
        },
        payload.into(),
    )
}

/// Build a parent-linked chain of `len` blocks from genesis.
pub fn chain_blocks(len: u64, seed: u8) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(len as usize);
    let mut parent = BlockHash::ZERO;
    for height in 1..=len {
        let block = make_block(Height::new(height), parent, seed);
        parent = block.hash();
        blocks.push(block);
    }
    blocks
}

/// Extend a chain with `count` further blocks built from `seed`.
///
/// Returns the full chain (shared prefix plus the extension). Extending the
/// same prefix with different seeds yields chains that fork right above the
/// prefix.
pub fn extend(blocks: &[Block], count: u64, seed: u8) -> Vec<Block> {
    let mut extended = blocks.to_vec();
    let mut parent = extended.last().map_or(BlockHash::ZERO, Block::hash);
    let start = extended.len() as u64 + 1;
    for height in start..start + count {
        let block = make_block(Height::new(height), parent, seed);
        parent = block.hash();
        extended.push(block);
    }
    extended
}

/// Wrap blocks in a [`MemoryChain`] with the given score.
pub fn memory_chain(blocks: Vec<Block>, score: u128) -> MemoryChain {
    MemoryChain::from_blocks(blocks, ChainScore::new(score))
}
