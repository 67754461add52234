//! The downstream consumer contract.
//!
//! Pulled block ranges are handed to a `BlockRangeConsumer` (the node's
//! processing pipeline). The consumer answers synchronously with a
//! correlator id and reports completion later, asynchronously, exactly once.

use peersync_core::BlockRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlator id the consumer assigns to an accepted range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Sentinel id meaning the consumer refused the range.
    pub const REJECTED: Self = Self(0);

    /// True when this is the refusal sentinel.
    pub fn is_rejected(self) -> bool {
        self == Self::REJECTED
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How processing of a submitted range ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// The range was processed.
    Normal,
    /// Processing was aborted; the range (and anything queued behind it)
    /// cannot be assumed applied.
    Aborted,
}

impl CompletionStatus {
    /// True for any status other than [`CompletionStatus::Normal`].
    pub fn is_abnormal(self) -> bool {
        !matches!(self, CompletionStatus::Normal)
    }
}

/// Completion callback for one submitted range.
///
/// Fires exactly once, asynchronously, on an arbitrary thread. Captured
/// state must be shared-ownership (`Arc`), never a raw back-reference, so a
/// callback that outlives its submitter still finds valid data.
pub type CompletionHandler = Box<dyn FnOnce(ElementId, CompletionStatus) + Send + 'static>;

/// The downstream processing pipeline block ranges are submitted to.
///
/// # Contract
///
/// - `add` answers synchronously: a fresh correlator id on acceptance, or
///   [`ElementId::REJECTED`] on refusal.
/// - On acceptance, `on_complete` fires exactly once, later and
///   asynchronously, never re-entrantly from inside `add` (the submitter
///   may hold a lock across the call).
/// - Across one submitter, completions fire in submission order.
pub trait BlockRangeConsumer: Send + Sync {
    /// Submit a range for processing.
    fn add(&self, range: BlockRange, on_complete: CompletionHandler) -> ElementId;
}
