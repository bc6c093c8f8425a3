//! # Stowage Support
//!
//! Shared utilities and traits for the Stowage container crates.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Replay awareness for stores that must know when an event log is replayed

pub mod rendering;
pub mod replay;

pub use replay::{ReplayAware, ReplayState, mark_replay_ended, mark_replay_started};
