//! Shared types and wire protocol for Coinline.
//!
//! This crate defines the "language" the rest of the workspace speaks:
//!
//! - **Identity and time** ([`PlayerHandle`], [`MachineId`], [`Timestamp`]) —
//!   the keys everything else is indexed by.
//! - **Snapshots** ([`FullState`], [`MachineSnapshot`], …) — a consistent,
//!   deterministic copy of the whole arcade floor, used for rendering,
//!   persistence, and round-trip comparison.
//! - **Wire messages** ([`ClientRequest`], [`ServerEvent`]) — what travels
//!   over an observer connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become bytes.
//!
//! The protocol layer knows nothing about queues, stores, or sockets — it
//! only describes data shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientRequest, CooldownSnapshot, FullState, MachineId, MachineSnapshot,
    PlayerHandle, PlayerSnapshot, ServerEvent, Timestamp, TurnPhase,
};
