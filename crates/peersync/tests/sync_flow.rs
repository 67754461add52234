//! End-to-end synchronization flows against in-memory chains.
//!
//! These tests drive a `ChainSynchronizer` the way the embedding node does:
//! tick it periodically, apply accepted ranges to the local chain the way a
//! processing pipeline would, and fire the completion callbacks.

use std::sync::Arc;

use peersync::{
    ChainSynchronizer, ComparisonOptions, CompletionStatus, Height, MemoryChain,
    NodeInteractionVerdict, PeerId, SynchronizerConfig,
};
use peersync_testkit::fixtures::{chain_blocks, extend, memory_chain};
use peersync_testkit::scripted::RecordingConsumer;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn make_synchronizer(
    local: Arc<MemoryChain>,
    consumer: Arc<RecordingConsumer>,
) -> ChainSynchronizer {
    let options = ComparisonOptions::new(20, Arc::new(|| Height::new(1)));
    let config = SynchronizerConfig {
        max_blocks_per_pull: 4,
        max_bytes_per_pull: 1 << 16,
    };
    ChainSynchronizer::new(local, consumer, options, config)
}

/// Copy the blocks of an accepted range from the remote chain onto the local
/// one, the way the downstream pipeline would apply them.
fn apply_accepted(local: &MemoryChain, remote: &MemoryChain, start: Height, end: Height) {
    let mut height = start;
    while height <= end {
        local.push(remote.block_at(height).expect("remote block missing"));
        height = height + 1;
    }
}

#[tokio::test]
async fn test_full_convergence_over_ticks() {
    init_tracing();

    let shared = chain_blocks(10, 1);
    let local = Arc::new(memory_chain(shared.clone(), 10));
    let remote = memory_chain(extend(&shared, 12, 1), 20);
    let consumer = Arc::new(RecordingConsumer::new());
    let peer = PeerId::random();

    let sync = make_synchronizer(Arc::clone(&local), Arc::clone(&consumer));

    // Three successful ticks pull 11..=22 in 4-block pages.
    for _ in 0..3 {
        assert_eq!(
            sync.synchronize(peer, &remote).await,
            NodeInteractionVerdict::Success
        );
    }
    assert_eq!(sync.unprocessed().max_height(), Height::new(22));

    // The peer has nothing above 22; the next tick finds nothing to pull.
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Neutral
    );

    // The pipeline processes the ranges in order.
    for accepted in consumer.accepted() {
        apply_accepted(&local, &remote, accepted.start_height, accepted.end_height);
        consumer.complete_next(CompletionStatus::Normal);
    }
    assert!(sync.unprocessed().is_empty());
    assert_eq!(local.height(), Height::new(22));
    local.set_score(remote.score());

    // Caught up: the next comparison reports an equal score, no pull.
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Neutral
    );
    assert_eq!(consumer.accepted().len(), 3);
}

#[tokio::test]
async fn test_submission_order_matches_pull_order() {
    init_tracing();

    let shared = chain_blocks(10, 1);
    let local = Arc::new(memory_chain(shared.clone(), 10));
    let remote = memory_chain(extend(&shared, 8, 1), 20);
    let consumer = Arc::new(RecordingConsumer::new());
    let peer = PeerId::random();

    let sync = make_synchronizer(Arc::clone(&local), Arc::clone(&consumer));

    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Success
    );
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Success
    );

    let accepted = consumer.accepted();
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0].start_height, Height::new(11));
    assert_eq!(accepted[0].end_height, Height::new(14));
    assert_eq!(accepted[1].start_height, Height::new(15));
    assert_eq!(accepted[1].end_height, Height::new(18));

    // FIFO completions drain cleanly.
    consumer.complete_next(CompletionStatus::Normal);
    consumer.complete_next(CompletionStatus::Normal);
    assert!(sync.unprocessed().is_empty());
    assert_eq!(sync.unprocessed().num_bytes(), 0);
}

#[tokio::test]
async fn test_aborted_range_suppresses_sync_until_drained() {
    init_tracing();

    let shared = chain_blocks(10, 1);
    let local = Arc::new(memory_chain(shared.clone(), 10));
    let remote = memory_chain(extend(&shared, 8, 1), 20);
    let consumer = Arc::new(RecordingConsumer::new());
    let peer = PeerId::random();

    let sync = make_synchronizer(Arc::clone(&local), Arc::clone(&consumer));

    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Success
    );
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Success
    );

    // The first range aborts while the second is still outstanding.
    consumer.complete_next(CompletionStatus::Aborted);

    // Dirty queue: ticks are gated, nothing new reaches the consumer.
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Neutral
    );
    assert_eq!(consumer.accepted().len(), 2);

    // Draining re-opens the gate; the engine starts over from a fresh
    // comparison.
    consumer.complete_next(CompletionStatus::Normal);
    assert_eq!(
        sync.synchronize(peer, &remote).await,
        NodeInteractionVerdict::Success
    );
    assert_eq!(consumer.accepted()[2].start_height, Height::new(11));
}

#[tokio::test]
async fn test_stale_peer_gets_neutral_verdicts() {
    init_tracing();

    let blocks = chain_blocks(20, 1);
    let local = Arc::new(memory_chain(blocks.clone(), 30));
    let consumer = Arc::new(RecordingConsumer::new());
    let peer = PeerId::random();

    let sync = make_synchronizer(Arc::clone(&local), Arc::clone(&consumer));

    // Same chain, lower score.
    let behind = memory_chain(blocks[..15].to_vec(), 10);
    assert_eq!(
        sync.synchronize(peer, &behind).await,
        NodeInteractionVerdict::Neutral
    );

    // A peer below the finalized floor.
    let options = ComparisonOptions::new(20, Arc::new(|| Height::new(8)));
    let sync = ChainSynchronizer::new(
        Arc::clone(&local) as Arc<dyn peersync::ChainView>,
        Arc::clone(&consumer) as Arc<dyn peersync::BlockRangeConsumer>,
        options,
        SynchronizerConfig::default(),
    );
    let floored = memory_chain(blocks[..5].to_vec(), 40);
    assert_eq!(
        sync.synchronize(peer, &floored).await,
        NodeInteractionVerdict::Neutral
    );
    assert!(consumer.accepted().is_empty());
}

#[tokio::test]
async fn test_forked_peer_gets_failure_verdict() {
    init_tracing();

    // Entirely different history with a better score: disagreement at the
    // floor.
    let local = Arc::new(memory_chain(chain_blocks(20, 1), 10));
    let remote = memory_chain(chain_blocks(20, 2), 40);
    let consumer = Arc::new(RecordingConsumer::new());

    let sync = make_synchronizer(Arc::clone(&local), Arc::clone(&consumer));
    assert_eq!(
        sync.synchronize(PeerId::random(), &remote).await,
        NodeInteractionVerdict::Failure
    );
    assert!(consumer.accepted().is_empty());
}
