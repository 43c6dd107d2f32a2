//! Codec trait and the JSON implementation.
//!
//! The room layer never touches bytes. Whatever sits in front of it (a
//! socket gateway, a test harness, the demo binary) decodes
//! [`ControlMessage`](crate::ControlMessage)s and encodes room events
//! through a [`Codec`], so the wire format can change without touching
//! game code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// task that talks to the registry.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use arena_protocol::{Codec, ControlMessage, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let msg = ControlMessage::Join { room_id: Some(RoomId::new("lobby")) };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ControlMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
