//! In-memory [`StateStore`] for tests and ephemeral runs.

use std::sync::Mutex;

use coinline_protocol::FullState;

use crate::{StateStore, StoreError};

/// A [`StateStore`] that holds the latest snapshot in memory.
///
/// Nothing survives process exit. Useful for tests (no filesystem, no
/// async setup) and for running the coordinator without durability.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<FullState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many saves have landed, by peeking at the stored state.
    ///
    /// Only whether *anything* is stored — kept minimal on purpose; tests
    /// that care about content go through [`StateStore::load`].
    pub fn is_written(&self) -> bool {
        self.state.lock().expect("store mutex poisoned").is_some()
    }
}

impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Option<FullState>, StoreError> {
        Ok(self.state.lock().expect("store mutex poisoned").clone())
    }

    async fn save(&self, state: &FullState) -> Result<(), StoreError> {
        *self.state.lock().expect("store mutex poisoned") = Some(state.clone());
        Ok(())
    }
}
