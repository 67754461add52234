//! Strong type definitions for the peersync engine.
//!
//! Heights, scores, and peer identities are newtypes to prevent misuse at
//! compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// The 1-based position of a block in a chain.
///
/// Height 1 is the genesis block. Height 0 is reserved as a sentinel for
/// "no block" (e.g. the end height of an empty range).
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Height(pub u64);

impl Height {
    /// The sentinel height below genesis.
    pub const ZERO: Self = Self(0);

    /// Create a new height.
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Get the raw value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Distance down to `other`, saturating at zero.
    pub const fn saturating_sub(self, other: Height) -> u64 {
        self.0.saturating_sub(other.0)
    }

    /// True for the sentinel height.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add<u64> for Height {
    type Output = Height;

    fn add(self, rhs: u64) -> Height {
        Height(self.0 + rhs)
    }
}

impl From<u64> for Height {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl fmt::Debug for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Height({})", self.0)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A totally ordered weight ranking competing chains.
///
/// Not necessarily derived from height: two chains of equal height can carry
/// different scores, and the higher-scored chain wins.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ChainScore(pub u128);

impl ChainScore {
    /// The zero score.
    pub const ZERO: Self = Self(0);

    /// Create a new score.
    pub const fn new(score: u128) -> Self {
        Self(score)
    }

    /// Get the raw value.
    pub const fn value(self) -> u128 {
        self.0
    }
}

impl From<u128> for ChainScore {
    fn from(score: u128) -> Self {
        Self(score)
    }
}

impl fmt::Debug for ChainScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainScore({})", self.0)
    }
}

impl fmt::Display for ChainScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a remote block source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random peer ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl From<[u8; 32]> for PeerId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// The (height, score) summary of one chain view at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatistics {
    /// Height of the chain tip.
    pub height: Height,
    /// Cumulative score of the chain.
    pub score: ChainScore,
}

impl ChainStatistics {
    /// Create new statistics.
    pub const fn new(height: Height, score: ChainScore) -> Self {
        Self { height, score }
    }
}
