//! Scripted collaborators for driving the engine through exact scenarios.
//!
//! [`ScriptedChainView`] replays canned responses, so tests can model peers
//! that lie, misbehave, or fail mid-round. [`RecordingConsumer`] stands in
//! for the downstream pipeline: it records every submission and lets the
//! test decide when and how each one completes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use peersync_core::{Block, BlockHash, BlockRange, ChainStatistics, Height, PeerId};
use peersync_chain::{
    BlockRangeConsumer, BlockReadOptions, ChainError, ChainView, CompletionHandler,
    CompletionStatus, ElementId, Result,
};

/// A chain view that answers each call with the next scripted response.
///
/// Panics when a call arrives with no response scripted for it: an
/// exhausted script means the test's expectations and the engine's behavior
/// disagree.
#[derive(Default)]
pub struct ScriptedChainView {
    statistics: Mutex<VecDeque<Result<ChainStatistics>>>,
    hash_pages: Mutex<VecDeque<Result<Vec<BlockHash>>>>,
    block_pages: Mutex<VecDeque<Result<Vec<Block>>>>,
}

impl ScriptedChainView {
    /// Create a view with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `statistics` response.
    pub fn push_statistics(&self, statistics: ChainStatistics) {
        self.statistics.lock().unwrap().push_back(Ok(statistics));
    }

    /// Script the next `statistics` call to fail.
    pub fn push_statistics_err(&self, error: ChainError) {
        self.statistics.lock().unwrap().push_back(Err(error));
    }

    /// Script the next `hashes_from` response.
    pub fn push_hash_page(&self, hashes: Vec<BlockHash>) {
        self.hash_pages.lock().unwrap().push_back(Ok(hashes));
    }

    /// Script the next `hashes_from` call to fail.
    pub fn push_hash_page_err(&self, error: ChainError) {
        self.hash_pages.lock().unwrap().push_back(Err(error));
    }

    /// Script the next `blocks_from` response.
    pub fn push_block_page(&self, blocks: Vec<Block>) {
        self.block_pages.lock().unwrap().push_back(Ok(blocks));
    }

    /// Script the next `blocks_from` call to fail.
    pub fn push_block_page_err(&self, error: ChainError) {
        self.block_pages.lock().unwrap().push_back(Err(error));
    }
}

#[async_trait]
impl ChainView for ScriptedChainView {
    async fn statistics(&self) -> Result<ChainStatistics> {
        self.statistics
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted: unexpected statistics call")
    }

    async fn hashes_from(&self, _start: Height, _max_count: u32) -> Result<Vec<BlockHash>> {
        self.hash_pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted: unexpected hashes_from call")
    }

    async fn blocks_from(&self, _start: Height, _options: BlockReadOptions) -> Result<Vec<Block>> {
        self.block_pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted: unexpected blocks_from call")
    }
}

/// Summary of one range accepted by a [`RecordingConsumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedRange {
    /// Correlator id assigned to the range.
    pub id: ElementId,
    /// Source the range was pulled from.
    pub source: PeerId,
    /// Height of the first block.
    pub start_height: Height,
    /// Height of the last block.
    pub end_height: Height,
    /// Number of blocks in the range.
    pub num_blocks: usize,
    /// Canonical encoded size of the range.
    pub byte_size: u64,
}

struct ConsumerState {
    next_id: u64,
    refuse: bool,
    accepted: Vec<AcceptedRange>,
    pending: VecDeque<(ElementId, CompletionHandler)>,
}

/// A downstream consumer that records submissions and defers completions to
/// the test.
///
/// Completion handlers are invoked outside the consumer's lock, matching the
/// real contract: never re-entrantly from inside `add`.
pub struct RecordingConsumer {
    state: Mutex<ConsumerState>,
}

impl RecordingConsumer {
    /// Create a consumer that accepts everything.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConsumerState {
                next_id: 1,
                refuse: false,
                accepted: Vec::new(),
                pending: VecDeque::new(),
            }),
        }
    }

    /// Make subsequent submissions be refused (or accepted again).
    pub fn set_refusing(&self, refuse: bool) {
        self.state.lock().unwrap().refuse = refuse;
    }

    /// Complete the oldest pending submission with `status`.
    ///
    /// # Panics
    ///
    /// Panics when nothing is pending.
    pub fn complete_next(&self, status: CompletionStatus) -> ElementId {
        self.complete_at(0, status)
    }

    /// Complete the pending submission at `index` (0 = oldest).
    ///
    /// Completing out of order violates the consumer contract on purpose;
    /// tests use it to exercise the fatal-invariant path.
    pub fn complete_at(&self, index: usize, status: CompletionStatus) -> ElementId {
        let (id, handler) = {
            let mut state = self.state.lock().unwrap();
            state
                .pending
                .remove(index)
                .expect("no pending completion at index")
        };
        handler(id, status);
        id
    }

    /// Everything accepted so far, in submission order.
    pub fn accepted(&self) -> Vec<AcceptedRange> {
        self.state.lock().unwrap().accepted.clone()
    }

    /// Number of submissions whose completion has not fired yet.
    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

impl Default for RecordingConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRangeConsumer for RecordingConsumer {
    fn add(&self, range: BlockRange, on_complete: CompletionHandler) -> ElementId {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            return ElementId::REJECTED;
        }
        let id = ElementId(state.next_id);
        state.next_id += 1;
        state.accepted.push(AcceptedRange {
            id,
            source: range.source(),
            start_height: range.start_height(),
            end_height: range.end_height(),
            num_blocks: range.len(),
            byte_size: range.byte_size(),
        });
        state.pending.push_back((id, on_complete));
        id
    }
}
