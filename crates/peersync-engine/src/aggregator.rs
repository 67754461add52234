//! Accumulation of pulled block batches into one ordered range.

use peersync_core::{Block, BlockRange, PeerId};

/// Accumulates successive block batches pulled from one remote source.
///
/// Single-use: [`merge`](RangeAggregator::merge) consumes the aggregator,
/// so it cannot be reused after merging.
pub struct RangeAggregator {
    source: PeerId,
    batches: Vec<Vec<Block>>,
    num_blocks: usize,
}

impl RangeAggregator {
    /// Create an empty aggregator for blocks pulled from `source`.
    pub fn new(source: PeerId) -> Self {
        Self {
            source,
            batches: Vec::new(),
            num_blocks: 0,
        }
    }

    /// Append one pulled batch.
    pub fn add(&mut self, batch: Vec<Block>) {
        self.num_blocks += batch.len();
        self.batches.push(batch);
    }

    /// Total number of accumulated blocks.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.num_blocks == 0
    }

    /// Concatenate all batches into one range tagged with the source.
    pub fn merge(self) -> BlockRange {
        let mut blocks = Vec::with_capacity(self.num_blocks);
        for batch in self.batches {
            blocks.extend(batch);
        }
        BlockRange::new(self.source, blocks)
    }
}
