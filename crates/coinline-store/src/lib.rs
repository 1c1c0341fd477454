//! Durable persistence for the Coinline floor state.
//!
//! The queue engine writes one full [`FullState`] snapshot after every
//! committed mutation and reads one back at startup. This crate defines
//! the seam ([`StateStore`]) and two implementations:
//!
//! - [`SqliteStore`] — SQLite via `sqlx`, the production store. The whole
//!   floor is tiny (a handful of machines, dozens of players), so every
//!   save rewrites the full snapshot in one transaction rather than
//!   tracking row-level diffs.
//! - [`MemoryStore`] — keeps the latest snapshot in memory. Used by tests
//!   and ephemeral runs.
//!
//! A store either applies a save completely or reports an error without
//! side effects visible to a later load; the engine relies on that to
//! keep its in-memory state and the durable state in lockstep.

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::future::Future;
use std::sync::Arc;

use coinline_protocol::FullState;

/// Durable storage for the floor snapshot.
///
/// The futures are `Send`-bounded because engine operations (which await
/// these) run inside spawned connection-handler tasks. Implementations
/// just write `async fn`.
pub trait StateStore: Send + Sync + 'static {
    /// Loads the last saved snapshot.
    ///
    /// Returns `Ok(None)` when the store has never been written — a fresh
    /// deployment, not an error.
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<FullState>, StoreError>> + Send;

    /// Replaces the stored snapshot with `state`, atomically.
    fn save(
        &self,
        state: &FullState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A shared store is a store: lets one store back an engine while other
/// code (tests, tooling) keeps a handle to it.
impl<S: StateStore> StateStore for Arc<S> {
    async fn load(&self) -> Result<Option<FullState>, StoreError> {
        (**self).load().await
    }

    async fn save(&self, state: &FullState) -> Result<(), StoreError> {
        (**self).save(state).await
    }
}
