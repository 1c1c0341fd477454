//! The Coinline queue engine: turn arbitration for a floor of shared
//! arcade machines.
//!
//! Each machine runs the same state machine — FIFO queue, timed turn
//! offer, accept/skip/finish — while the engine as a whole enforces the
//! rules that span machines: a player holds at most one active turn at a
//! time, busy queue heads rotate back without penalty, courtesy cooldowns
//! gate immediate re-joins, and a global pause freezes all automatic
//! movement.
//!
//! # Key types
//!
//! - [`QueueEngine`] — the serialized, persisted entry point
//! - [`FloorState`] — the pure aggregate all transitions run against
//! - [`EngineConfig`] — machines, turn timeout, courtesy cooldown
//! - [`Clock`] / [`SystemClock`] / [`ManualClock`] — wall-clock seam
//! - [`EngineError`] and the per-operation error enums

mod clock;
mod config;
mod engine;
mod error;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::QueueEngine;
pub use error::{
    AcceptError, AdminError, EngineError, FinishError, JoinError, LeaveError,
    SkipError,
};
pub use state::FloorState;
