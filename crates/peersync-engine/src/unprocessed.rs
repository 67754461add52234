//! The bounded FIFO of block ranges submitted downstream but not yet
//! completed.
//!
//! Shared between the driving tick and the downstream consumer's completion
//! callbacks, which may fire on any worker thread at any later time. Every
//! operation synchronizes on one internal mutex with O(1) critical sections;
//! no method suspends, so the lock is never held across a suspension point.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use peersync_core::{BlockRange, Height};
use peersync_chain::{BlockRangeConsumer, CompletionStatus, ElementId};
use tracing::{debug, error, warn};

/// Bookkeeping for one accepted range.
#[derive(Debug, Clone, Copy)]
struct ElementInfo {
    id: ElementId,
    end_height: Height,
    byte_size: u64,
}

struct Inner {
    elements: VecDeque<ElementInfo>,
    total_bytes: u64,
    max_height: Height,
    sync_pending: bool,
    dirty: bool,
}

/// Thread-safe FIFO of submitted-but-incomplete ranges under a byte budget.
///
/// The queue turns dirty when a completion reports an abnormal status while
/// other elements are still outstanding: everything queued behind the failed
/// range is suspect. While dirty, no new ranges are accepted and no new sync
/// attempts start; the flag clears once the queue has fully drained.
pub struct UnprocessedRanges {
    byte_budget: u64,
    inner: Mutex<Inner>,
}

impl UnprocessedRanges {
    /// Create a queue with the given byte budget.
    pub fn new(byte_budget: u64) -> Self {
        Self {
            byte_budget,
            inner: Mutex::new(Inner {
                elements: VecDeque::new(),
                total_bytes: 0,
                max_height: Height::ZERO,
                sync_pending: false,
                dirty: false,
            }),
        }
    }

    /// Atomically claim the right to run one synchronization attempt.
    ///
    /// Returns true (and marks an attempt pending) iff the byte total is
    /// under budget, no attempt is already pending, and the queue is clean.
    /// The claim is released with [`clear_pending_sync`](Self::clear_pending_sync).
    pub fn should_start_sync(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.dirty || inner.sync_pending || inner.total_bytes >= self.byte_budget {
            return false;
        }
        inner.sync_pending = true;
        true
    }

    /// Submit a range downstream and track it.
    ///
    /// Rejects without forwarding while dirty, and rejects a range that
    /// would push a non-empty queue over the byte budget (an empty queue
    /// accepts one oversized range so a fork repair larger than the whole
    /// budget still makes progress). Otherwise forwards to `consumer`; a
    /// sentinel id means the consumer refused. Returns true on acceptance.
    ///
    /// The completion handler handed to the consumer captures an `Arc` of
    /// this queue, so a callback firing after the synchronizer is gone still
    /// finds valid data. The queue lock is held across the forwarding call;
    /// consumers must never invoke the handler re-entrantly from `add`.
    pub fn add(self: &Arc<Self>, range: BlockRange, consumer: &dyn BlockRangeConsumer) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.dirty {
            debug!("rejecting range while queue is dirty");
            return false;
        }

        let byte_size = range.byte_size();
        if !inner.elements.is_empty() && inner.total_bytes + byte_size > self.byte_budget {
            debug!(
                byte_size,
                total_bytes = inner.total_bytes,
                byte_budget = self.byte_budget,
                "rejecting range that would overflow the byte budget"
            );
            return false;
        }

        let end_height = range.end_height();
        let this = Arc::clone(self);
        let id = consumer.add(range, Box::new(move |id, status| this.remove(id, status)));
        if id.is_rejected() {
            debug!(%end_height, "downstream consumer refused range");
            return false;
        }

        inner.total_bytes += byte_size;
        if end_height > inner.max_height {
            inner.max_height = end_height;
        }
        inner.elements.push_back(ElementInfo {
            id,
            end_height,
            byte_size,
        });
        debug!(%id, %end_height, byte_size, total_bytes = inner.total_bytes, "range accepted");
        true
    }

    /// Observe the completion of the front element.
    ///
    /// Invoked by the completion handler, on an arbitrary thread. The id
    /// must equal the FIFO front: completions out of submission order mean
    /// the bookkeeping no longer describes reality, which is a programming
    /// error, not a recoverable condition.
    ///
    /// # Panics
    ///
    /// Panics when `id` is not the front element (or the queue is empty).
    pub fn remove(&self, id: ElementId, status: CompletionStatus) {
        let mut inner = self.inner.lock().unwrap();
        let front = match inner.elements.pop_front() {
            Some(front) => front,
            None => {
                error!(%id, "completion delivered against an empty queue");
                panic!("completion {id} delivered against an empty queue");
            }
        };
        if front.id != id {
            error!(expected = %front.id, got = %id, "completion out of submission order");
            panic!(
                "completion out of submission order: expected front {}, got {}",
                front.id, id
            );
        }

        inner.total_bytes -= front.byte_size;
        if inner.elements.is_empty() {
            // Drained: nothing suspect is left behind. Gated ticks never
            // reach clear_pending_sync, so the drain is observed here too.
            if inner.dirty {
                debug!("queue drained; clearing dirty flag");
                inner.dirty = false;
            }
        } else if status.is_abnormal() {
            warn!(
                %id,
                ?status,
                outstanding = inner.elements.len(),
                "abnormal completion with elements outstanding; marking queue dirty"
            );
            inner.dirty = true;
        }
    }

    /// Release the pending-sync claim taken by
    /// [`should_start_sync`](Self::should_start_sync). A no-op when already
    /// clear. Also clears the dirty flag once the queue has drained.
    pub fn clear_pending_sync(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_pending = false;
        if inner.dirty && inner.elements.is_empty() {
            debug!("queue drained; clearing dirty flag");
            inner.dirty = false;
        }
    }

    /// Highest end height ever accepted. Meaningful only while the queue is
    /// non-empty.
    pub fn max_height(&self) -> Height {
        self.inner.lock().unwrap().max_height
    }

    /// True when no elements are outstanding.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().elements.is_empty()
    }

    /// Current byte total of outstanding elements.
    pub fn num_bytes(&self) -> u64 {
        self.inner.lock().unwrap().total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peersync_core::PeerId;
    use peersync_testkit::fixtures::chain_blocks;
    use peersync_testkit::scripted::RecordingConsumer;

    fn range_of(heights: std::ops::RangeInclusive<u64>) -> BlockRange {
        let blocks = chain_blocks(*heights.end(), 1);
        let slice = blocks[(*heights.start() - 1) as usize..].to_vec();
        BlockRange::new(PeerId::from_bytes([9; 32]), slice)
    }

    fn queue() -> Arc<UnprocessedRanges> {
        Arc::new(UnprocessedRanges::new(1 << 20))
    }

    #[test]
    fn test_should_start_sync_claims_once() {
        let queue = queue();
        assert!(queue.should_start_sync());
        assert!(!queue.should_start_sync());
        queue.clear_pending_sync();
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_clear_pending_sync_idempotent() {
        let queue = queue();
        queue.clear_pending_sync();
        queue.clear_pending_sync();
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_add_tracks_bytes_and_height() {
        let queue = queue();
        let consumer = RecordingConsumer::new();
        let range = range_of(1..=5);
        let bytes = range.byte_size();

        assert!(queue.add(range, &consumer));
        assert_eq!(queue.num_bytes(), bytes);
        assert_eq!(queue.max_height(), Height::new(5));
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_add_remove_roundtrip_restores_state() {
        let queue = queue();
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=4), &consumer));
        consumer.complete_next(CompletionStatus::Normal);

        assert!(queue.is_empty());
        assert_eq!(queue.num_bytes(), 0);
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_refused_add_leaves_state_untouched() {
        let queue = queue();
        let consumer = RecordingConsumer::new();
        consumer.set_refusing(true);

        assert!(!queue.add(range_of(1..=4), &consumer));
        assert_eq!(queue.num_bytes(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_over_budget_add_rejected_without_forwarding() {
        let queue = Arc::new(UnprocessedRanges::new(64));
        let consumer = RecordingConsumer::new();

        // An empty queue accepts even an oversized range.
        assert!(queue.add(range_of(1..=3), &consumer));
        let accepted_bytes = queue.num_bytes();
        assert!(accepted_bytes > 64);

        // A non-empty queue over budget refuses, and the consumer never
        // sees the range.
        assert!(!queue.add(range_of(4..=5), &consumer));
        assert_eq!(queue.num_bytes(), accepted_bytes);
        assert_eq!(consumer.accepted().len(), 1);
    }

    #[test]
    fn test_budget_gates_should_start_sync() {
        let queue = Arc::new(UnprocessedRanges::new(8));
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=2), &consumer));
        assert!(queue.num_bytes() >= 8);
        assert!(!queue.should_start_sync());

        consumer.complete_next(CompletionStatus::Normal);
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_completions_in_fifo_order() {
        let queue = queue();
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=2), &consumer));
        assert!(queue.add(range_of(3..=4), &consumer));
        assert!(queue.add(range_of(5..=6), &consumer));

        consumer.complete_next(CompletionStatus::Normal);
        consumer.complete_next(CompletionStatus::Normal);
        consumer.complete_next(CompletionStatus::Normal);

        assert!(queue.is_empty());
        assert_eq!(queue.num_bytes(), 0);
    }

    #[test]
    #[should_panic(expected = "out of submission order")]
    fn test_out_of_order_completion_is_fatal() {
        let queue = queue();
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=2), &consumer));
        assert!(queue.add(range_of(3..=4), &consumer));

        // Completing the second element while the first is outstanding is a
        // contract violation by the consumer.
        consumer.complete_at(1, CompletionStatus::Normal);
    }

    #[test]
    fn test_abnormal_completion_marks_dirty() {
        let queue = queue();
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=2), &consumer));
        assert!(queue.add(range_of(3..=4), &consumer));

        consumer.complete_next(CompletionStatus::Aborted);

        // Dirty: rejects adds and blocks syncs until drained.
        assert!(!queue.add(range_of(5..=6), &consumer));
        assert!(!queue.should_start_sync());

        // Clearing the pending-sync claim does not clear dirty while
        // elements are still outstanding.
        queue.clear_pending_sync();
        assert!(!queue.should_start_sync());

        // Draining clears it.
        consumer.complete_next(CompletionStatus::Normal);
        assert!(queue.is_empty());
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_abnormal_completion_of_last_element_stays_clean() {
        let queue = queue();
        let consumer = RecordingConsumer::new();

        assert!(queue.add(range_of(1..=2), &consumer));
        consumer.complete_next(CompletionStatus::Aborted);

        // Nothing was outstanding behind it, so the queue is not dirty.
        assert!(queue.should_start_sync());
    }

    #[test]
    fn test_late_completion_after_submitter_dropped() {
        let queue = queue();
        let consumer = RecordingConsumer::new();
        assert!(queue.add(range_of(1..=2), &consumer));

        // The handler holds its own Arc; dropping ours must not invalidate
        // the callback's view of the queue.
        drop(queue);
        consumer.complete_next(CompletionStatus::Normal);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // A rejected add never mutates the byte total, whatever the
            // refusal reason.
            #[test]
            fn rejected_add_never_mutates_bytes(budget in 1u64..256, refuse: bool) {
                let queue = Arc::new(UnprocessedRanges::new(budget));
                let consumer = RecordingConsumer::new();
                consumer.set_refusing(refuse);

                let before = queue.num_bytes();
                let accepted = queue.add(range_of(1..=2), &consumer);
                if !accepted {
                    prop_assert_eq!(queue.num_bytes(), before);
                }
            }

            // Accepting then completing any number of ranges always drains
            // back to zero bytes.
            #[test]
            fn accepted_bytes_drain_to_zero(count in 1usize..8) {
                let queue = Arc::new(UnprocessedRanges::new(u64::MAX));
                let consumer = RecordingConsumer::new();

                let mut accepted = 0;
                for i in 0..count {
                    let start = (i as u64) * 2 + 1;
                    if queue.add(range_of(start..=start + 1), &consumer) {
                        accepted += 1;
                    }
                }
                for _ in 0..accepted {
                    consumer.complete_next(CompletionStatus::Normal);
                }
                prop_assert_eq!(queue.num_bytes(), 0);
                prop_assert!(queue.is_empty());
            }
        }
    }
}
