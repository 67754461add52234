//! Proptest generators for property-based testing.

use proptest::prelude::*;

use peersync_core::{Block, BlockHash, BlockRange, ChainScore, ChainStatistics, Height, PeerId};

use crate::fixtures::make_block;

/// Generate a plausible chain height.
pub fn height() -> impl Strategy<Value = Height> {
    (1u64..1_000_000).prop_map(Height::new)
}

/// Generate a chain score.
pub fn chain_score() -> impl Strategy<Value = ChainScore> {
    any::<u64>().prop_map(|s| ChainScore::new(s as u128))
}

/// Generate chain statistics.
pub fn chain_statistics() -> impl Strategy<Value = ChainStatistics> {
    (height(), chain_score()).prop_map(|(height, score)| ChainStatistics::new(height, score))
}

/// Generate a random peer ID.
pub fn peer_id() -> impl Strategy<Value = PeerId> {
    any::<[u8; 32]>().prop_map(PeerId::from_bytes)
}

/// Generate a random block hash.
pub fn block_hash() -> impl Strategy<Value = BlockHash> {
    any::<[u8; 32]>().prop_map(BlockHash::from_bytes)
}

/// Generate a single block at an arbitrary height.
pub fn block() -> impl Strategy<Value = Block> {
    (height(), block_hash(), any::<u8>())
        .prop_map(|(height, parent, seed)| make_block(height, parent, seed))
}

/// Generate a height-contiguous block range of 1 to `max_len` blocks.
pub fn block_range(max_len: u64) -> impl Strategy<Value = BlockRange> {
    (peer_id(), height(), 1..=max_len, any::<u8>()).prop_map(|(source, start, len, seed)| {
        let mut blocks = Vec::with_capacity(len as usize);
        let mut parent = BlockHash::ZERO;
        for offset in 0..len {
            let block = make_block(Height::new(start.value() + offset), parent, seed);
            parent = block.hash();
            blocks.push(block);
        }
        BlockRange::new(source, blocks)
    })
}
