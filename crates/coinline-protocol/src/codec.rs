//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The transport and server layers never call `serde_json` directly —
//! they go through the [`Codec`] trait, so the wire format can change
//! (say, to a binary codec) without touching connection handling.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are stored in long-lived
/// connection handler tasks that may hop threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, so observer payloads can be inspected in browser
/// DevTools and logs. Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use coinline_protocol::{ClientRequest, Codec, JsonCodec, MachineId};
///
/// let codec = JsonCodec;
/// let msg = ClientRequest::Join { machine: MachineId::new("Maimai") };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ClientRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
