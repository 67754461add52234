//! Chain comparison: decide how a remote peer's chain relates to ours.
//!
//! A comparison is a small async protocol round: one concurrent statistics
//! fetch, then hash pages at increasing heights until a terminal outcome.
//! The comparer is stateless across invocations; one instance serves exactly
//! one round.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use peersync_core::{BlockHash, Height};
use peersync_chain::{ChainView, FinalizedHeightSupplier};
use tracing::debug;

use crate::error::{Result, SyncError};

/// Terminal code of one comparison round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonCode {
    /// The remote's reported score is below ours; nothing to pull.
    RemoteReportedLowerChainScore,
    /// The remote's reported score equals ours; nothing to pull.
    RemoteReportedEqualChainScore,
    /// The remote's tip is at or below our finalized floor.
    RemoteIsTooFarBehind,
    /// The remote disagrees with us at or below the finalized floor.
    RemoteIsForked,
    /// The remote returned more hashes than were requested.
    RemoteReturnedTooManyHashes,
    /// The local chain changed mid-round; benign race, retry later.
    LocalHeightUpdated,
    /// The remote's chain ends below the score it advertised.
    RemoteLiedAboutChainScore,
    /// The remote is ahead (or forked above the floor); blocks can be pulled.
    RemoteIsNotSynced,
}

/// Result of one comparison round.
///
/// `common_block_height` is meaningful only for
/// [`ComparisonCode::RemoteIsNotSynced`]; `fork_depth` is the distance from
/// the common block up to the local tip observed during the round, used as
/// an upper bound on how many blocks to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonOutcome {
    code: ComparisonCode,
    common_block_height: Height,
    fork_depth: u64,
}

impl ComparisonOutcome {
    /// A terminal outcome that does not lead to a pull.
    pub fn terminal(code: ComparisonCode) -> Self {
        debug_assert!(code != ComparisonCode::RemoteIsNotSynced);
        Self {
            code,
            common_block_height: Height::ZERO,
            fork_depth: 0,
        }
    }

    /// The pull-eligible outcome.
    pub fn not_synced(common_block_height: Height, fork_depth: u64) -> Self {
        Self {
            code: ComparisonCode::RemoteIsNotSynced,
            common_block_height,
            fork_depth,
        }
    }

    /// The terminal code.
    pub fn code(&self) -> ComparisonCode {
        self.code
    }

    /// Highest height at which both views agreed.
    pub fn common_block_height(&self) -> Height {
        self.common_block_height
    }

    /// Distance from the common block to the local tip at comparison time.
    pub fn fork_depth(&self) -> u64 {
        self.fork_depth
    }
}

/// Options for a comparison round.
#[derive(Clone)]
pub struct ComparisonOptions {
    hashes_per_batch: u32,
    finalized: Arc<dyn FinalizedHeightSupplier>,
}

impl ComparisonOptions {
    /// Create options.
    ///
    /// # Panics
    ///
    /// Panics when `hashes_per_batch` is zero.
    pub fn new(hashes_per_batch: u32, finalized: Arc<dyn FinalizedHeightSupplier>) -> Self {
        assert!(hashes_per_batch > 0, "hashes_per_batch must be positive");
        Self {
            hashes_per_batch,
            finalized,
        }
    }

    /// Maximum hashes requested per page.
    pub fn hashes_per_batch(&self) -> u32 {
        self.hashes_per_batch
    }

    /// Sample the current finalized height.
    pub fn finalized_height(&self) -> Height {
        self.finalized.finalized_height()
    }
}

impl fmt::Debug for ComparisonOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonOptions")
            .field("hashes_per_batch", &self.hashes_per_batch)
            .finish_non_exhaustive()
    }
}

/// Compares a local and a remote chain view. One instance, one round.
pub struct ChainComparer<'a> {
    local: &'a dyn ChainView,
    remote: &'a dyn ChainView,
    options: &'a ComparisonOptions,
}

impl<'a> ChainComparer<'a> {
    /// Create a comparer for one round.
    pub fn new(
        local: &'a dyn ChainView,
        remote: &'a dyn ChainView,
        options: &'a ComparisonOptions,
    ) -> Self {
        Self {
            local,
            remote,
            options,
        }
    }

    /// Run the round to its terminal outcome.
    ///
    /// A transport failure from either view aborts immediately and is
    /// propagated, never reinterpreted as a comparison code.
    pub async fn compare(self) -> Result<ComparisonOutcome> {
        let (local_stats, remote_stats) = tokio::try_join!(
            async { self.local.statistics().await.map_err(SyncError::Local) },
            async { self.remote.statistics().await.map_err(SyncError::Remote) },
        )?;

        // The floor is sampled once per round; both the too-far-behind check
        // and the first hash page use the same value.
        let finalized = self.options.finalized_height();
        debug!(
            local_height = %local_stats.height,
            local_score = %local_stats.score,
            remote_height = %remote_stats.height,
            remote_score = %remote_stats.score,
            %finalized,
            "comparing chains"
        );

        if remote_stats.height <= finalized {
            return Ok(ComparisonOutcome::terminal(
                ComparisonCode::RemoteIsTooFarBehind,
            ));
        }

        match remote_stats.score.cmp(&local_stats.score) {
            Ordering::Less => Ok(ComparisonOutcome::terminal(
                ComparisonCode::RemoteReportedLowerChainScore,
            )),
            Ordering::Equal => Ok(ComparisonOutcome::terminal(
                ComparisonCode::RemoteReportedEqualChainScore,
            )),
            // The remote claims a better chain; find where the views part.
            Ordering::Greater => self.compare_hashes(finalized, local_stats.height).await,
        }
    }

    /// Hash pagination at increasing heights until a terminal outcome.
    ///
    /// `local_ceiling` is the local height recorded from the statistics
    /// phase; pagination never walks past it.
    async fn compare_hashes(
        &self,
        finalized: Height,
        local_ceiling: Height,
    ) -> Result<ComparisonOutcome> {
        let batch = self.options.hashes_per_batch();
        // Heights are 1-based; a floor of zero means nothing is finalized
        // yet and the walk starts at genesis.
        let mut height = if finalized.is_zero() {
            Height::new(1)
        } else {
            finalized
        };
        let mut is_first_page = true;

        loop {
            let (local_hashes, remote_hashes) = tokio::try_join!(
                async {
                    self.local
                        .hashes_from(height, batch)
                        .await
                        .map_err(SyncError::Local)
                },
                async {
                    self.remote
                        .hashes_from(height, batch)
                        .await
                        .map_err(SyncError::Remote)
                },
            )?;

            if remote_hashes.len() > batch as usize {
                return Ok(ComparisonOutcome::terminal(
                    ComparisonCode::RemoteReturnedTooManyHashes,
                ));
            }

            let first_difference = first_difference_index(&local_hashes, &remote_hashes);
            if is_first_page && first_difference == 0 {
                // Disagreement at or below the immutable floor.
                return Ok(ComparisonOutcome::terminal(ComparisonCode::RemoteIsForked));
            }

            let common = Height::new(height.value() + first_difference as u64 - 1);
            let local_derived = Height::new(height.value() + local_hashes.len() as u64 - 1);

            if first_difference < remote_hashes.len() {
                // Either a real mismatch inside this page, or the local
                // view ran out while the remote kept going (plain "remote
                // is ahead").
                return Ok(ComparisonOutcome::not_synced(
                    common,
                    local_derived.saturating_sub(common),
                ));
            }

            // Every returned remote hash matched.
            if remote_hashes.len() == batch as usize {
                if local_derived < local_ceiling {
                    debug!(next = %(local_derived + 1), "hash page fully matched; advancing");
                    height = local_derived + 1;
                    is_first_page = false;
                    continue;
                }
                // Matched all the way to the local ceiling and the remote
                // still has more.
                return Ok(ComparisonOutcome::not_synced(local_derived, 0));
            }

            // The remote chain ended inside this page.
            return Ok(ComparisonOutcome::terminal(if local_derived < local_ceiling {
                // The local view shrank mid-round; do not penalize the peer.
                ComparisonCode::LocalHeightUpdated
            } else {
                ComparisonCode::RemoteLiedAboutChainScore
            }));
        }
    }
}

/// First position where the two hash pages disagree; the shorter page's
/// length when every compared position matches.
fn first_difference_index(local: &[BlockHash], remote: &[BlockHash]) -> usize {
    local
        .iter()
        .zip(remote)
        .take_while(|(lhs, rhs)| lhs == rhs)
        .count()
}
