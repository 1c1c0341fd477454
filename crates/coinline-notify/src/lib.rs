//! In-process change-notice bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ChangeBus`] is the fan-out point between the queue engine and its
//! observers. The engine publishes one [`ChangeNotice`] after every
//! committed mutation; each observer holds a [`ChangeFeed`] and re-fetches
//! a full snapshot whenever a notice arrives.
//!
//! Notices are deliberately payload-free. A slow observer that misses a
//! few loses nothing — the next snapshot is always complete — so lagged
//! receivers simply coalesce onto the most recent notice instead of
//! replaying the backlog.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// A "something changed, re-fetch" token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    /// Monotonically increasing publish counter (starts at 1).
    pub seq: u64,
}

/// Publish/subscribe hub for [`ChangeNotice`]s.
///
/// Cheap to share: the engine owns one and hands out feeds. Publishing
/// never blocks — when the buffer is full the oldest un-consumed notices
/// are dropped and slow receivers observe a lag, which [`ChangeFeed`]
/// swallows.
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeNotice>,
    seq: AtomicU64,
}

impl ChangeBus {
    /// Creates a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            seq: AtomicU64::new(0),
        }
    }

    /// Publishes a change notice to all current subscribers.
    ///
    /// Returns the sequence number assigned to the notice. With zero
    /// subscribers the notice is silently dropped — state lives in the
    /// engine, not on the bus.
    pub fn publish(&self) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let receivers = self.sender.receiver_count();
        let _ = self.sender.send(ChangeNotice { seq });
        tracing::trace!(seq, receivers, "change notice published");
        seq
    }

    /// Subscribes to all notices published after this call.
    pub fn subscribe(&self) -> ChangeFeed {
        ChangeFeed {
            receiver: self.sender.subscribe(),
        }
    }

    /// The sequence number of the most recently published notice.
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One observer's subscription to a [`ChangeBus`].
pub struct ChangeFeed {
    receiver: broadcast::Receiver<ChangeNotice>,
}

impl ChangeFeed {
    /// Waits for the next change notice.
    ///
    /// Returns `None` once the bus has been dropped and the backlog is
    /// drained. Lag is not an error: if this feed fell behind, the missed
    /// notices are skipped and the next available one is returned.
    pub async fn next(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) => return Some(notice),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "change feed lagged, coalescing");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
