//! One synchronization attempt per tick against one remote peer.
//!
//! An external scheduler drives [`ChainSynchronizer::synchronize`]
//! periodically; this module owns everything between the gate and the
//! verdict: comparison, block pulling, aggregation, and submission.

use std::sync::Arc;

use peersync_core::{BlockRange, PeerId};
use peersync_chain::{BlockRangeConsumer, BlockReadOptions, ChainView};
use tracing::{debug, warn};

use crate::aggregator::RangeAggregator;
use crate::comparer::{ChainComparer, ComparisonCode, ComparisonOptions, ComparisonOutcome};
use crate::error::{Result, SyncError};
use crate::unprocessed::UnprocessedRanges;
use crate::verdict::{NodeInteractionVerdict, VerdictPolicy};

/// Budgets for one synchronization attempt.
#[derive(Debug, Clone, Copy)]
pub struct SynchronizerConfig {
    /// Maximum blocks requested per pull page.
    pub max_blocks_per_pull: u32,
    /// Maximum bytes requested per pull page.
    pub max_bytes_per_pull: u64,
}

impl SynchronizerConfig {
    /// Byte budget of the unprocessed queue: three pull pages' worth.
    pub fn queue_byte_budget(&self) -> u64 {
        3 * self.max_bytes_per_pull
    }

    fn block_read_options(&self) -> BlockReadOptions {
        BlockReadOptions {
            max_count: self.max_blocks_per_pull,
            max_bytes: self.max_bytes_per_pull,
        }
    }
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            max_blocks_per_pull: 128,
            max_bytes_per_pull: 8 * 1024 * 1024,
        }
    }
}

/// Orchestrates synchronization attempts against one remote peer connection.
///
/// At most one attempt is in flight at a time; the gate lives in the shared
/// [`UnprocessedRanges`] so completion callbacks and the driving tick agree
/// on it.
pub struct ChainSynchronizer {
    local: Arc<dyn ChainView>,
    consumer: Arc<dyn BlockRangeConsumer>,
    options: ComparisonOptions,
    config: SynchronizerConfig,
    policy: VerdictPolicy,
    unprocessed: Arc<UnprocessedRanges>,
}

impl ChainSynchronizer {
    /// Create a synchronizer over the local view and downstream consumer.
    pub fn new(
        local: Arc<dyn ChainView>,
        consumer: Arc<dyn BlockRangeConsumer>,
        options: ComparisonOptions,
        config: SynchronizerConfig,
    ) -> Self {
        let unprocessed = Arc::new(UnprocessedRanges::new(config.queue_byte_budget()));
        Self {
            local,
            consumer,
            options,
            config,
            policy: VerdictPolicy::default(),
            unprocessed,
        }
    }

    /// Replace the default verdict policy.
    pub fn with_policy(mut self, policy: VerdictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The queue of submitted-but-incomplete ranges.
    pub fn unprocessed(&self) -> &Arc<UnprocessedRanges> {
        &self.unprocessed
    }

    /// Run one synchronization attempt and produce the peer's verdict.
    ///
    /// Returns `Neutral` immediately when the gate is closed (an attempt is
    /// already pending, the queue is over budget, or the queue is dirty).
    /// The pending-sync claim is released exactly once on every exit path.
    pub async fn synchronize(
        &self,
        remote_id: PeerId,
        remote: &dyn ChainView,
    ) -> NodeInteractionVerdict {
        if !self.unprocessed.should_start_sync() {
            debug!(peer = %remote_id, "sync gate closed; skipping tick");
            return NodeInteractionVerdict::Neutral;
        }
        let _pending = PendingSyncGuard(&self.unprocessed);
        self.run_attempt(remote_id, remote).await
    }

    async fn run_attempt(&self, remote_id: PeerId, remote: &dyn ChainView) -> NodeInteractionVerdict {
        let outcome = if !self.unprocessed.is_empty() {
            // Ranges are already accepted downstream; keep extending that
            // gap instead of re-running a comparison against it.
            ComparisonOutcome::not_synced(self.unprocessed.max_height(), 0)
        } else {
            let comparer = ChainComparer::new(&*self.local, remote, &self.options);
            match comparer.compare().await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(peer = %remote_id, %err, "chain comparison aborted");
                    return NodeInteractionVerdict::Failure;
                }
            }
        };

        if outcome.code() != ComparisonCode::RemoteIsNotSynced {
            let verdict = self.policy.verdict_for(outcome.code());
            debug!(peer = %remote_id, code = ?outcome.code(), ?verdict, "comparison terminal");
            return verdict;
        }

        debug!(
            peer = %remote_id,
            common = %outcome.common_block_height(),
            fork_depth = outcome.fork_depth(),
            "pulling blocks"
        );
        match self.pull_blocks(remote_id, remote, &outcome).await {
            Ok(Some(range)) => {
                if self.unprocessed.add(range, &*self.consumer) {
                    NodeInteractionVerdict::Success
                } else {
                    NodeInteractionVerdict::Neutral
                }
            }
            Ok(None) => NodeInteractionVerdict::Neutral,
            Err(err) => {
                warn!(peer = %remote_id, %err, "block pull aborted");
                NodeInteractionVerdict::Failure
            }
        }
    }

    /// Pull pages starting right above the common block until the fork depth
    /// is covered or the peer runs out of blocks.
    async fn pull_blocks(
        &self,
        remote_id: PeerId,
        remote: &dyn ChainView,
        outcome: &ComparisonOutcome,
    ) -> Result<Option<BlockRange>> {
        let mut aggregator = RangeAggregator::new(remote_id);
        let read = self.config.block_read_options();

        loop {
            let start = outcome.common_block_height() + 1 + aggregator.num_blocks() as u64;
            let batch = remote
                .blocks_from(start, read)
                .await
                .map_err(SyncError::Remote)?;
            if batch.is_empty() {
                // Peer exhausted.
                break;
            }
            debug!(peer = %remote_id, %start, blocks = batch.len(), "pulled block page");
            aggregator.add(batch);
            if aggregator.num_blocks() as u64 >= outcome.fork_depth() {
                break;
            }
        }

        if aggregator.is_empty() {
            Ok(None)
        } else {
            Ok(Some(aggregator.merge()))
        }
    }
}

/// Releases the pending-sync claim when the attempt scope ends, whatever the
/// exit path.
struct PendingSyncGuard<'a>(&'a UnprocessedRanges);

impl Drop for PendingSyncGuard<'_> {
    fn drop(&mut self) {
        self.0.clear_pending_sync();
    }
}
