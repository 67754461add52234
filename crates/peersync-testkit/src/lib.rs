//! # Peersync Testkit
//!
//! Testing utilities shared by the peersync crates:
//!
//! - [`fixtures`] - deterministic chains and blocks
//! - [`scripted`] - a chain view that replays canned responses (including
//!   misbehavior and transport failures) and a consumer that records
//!   submissions and lets tests drive completions
//! - [`generators`] - proptest strategies for core types

pub mod fixtures;
pub mod generators;
pub mod scripted;

pub use fixtures::{chain_blocks, extend, make_block, memory_chain};
pub use scripted::{AcceptedRange, RecordingConsumer, ScriptedChainView};
