//! Unified error type for the Coinline coordinator.

use coinline_engine::EngineError;
use coinline_protocol::ProtocolError;
use coinline_store::StoreError;
use coinline_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `coinline` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CoinlineError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A queue-engine error (typed operation failure or persistence).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A persistence error raised outside the engine (opening the store).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem trouble during startup (creating the data directory).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
