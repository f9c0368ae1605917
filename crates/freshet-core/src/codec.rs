//! Serialization boundary between typed test data and byte-level channels.
//!
//! Channels, stores, and operators work on bytes; a [`Codec`] converts a
//! typed value to and from that representation at the edges. Round-trips
//! are assumed lossless and are not re-validated.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error from encoding or decoding at the codec boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// Encoding a typed value to bytes failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Decoding bytes back to a typed value failed.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Two-way codec between a typed value and its byte representation.
pub trait Codec<T> {
    /// Encodes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Encode` when the value cannot be represented.
    fn encode(&self, item: &T) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes back to a value.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` when the bytes are not a valid encoding.
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec for any serde-serializable type.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    /// Creates a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec<T> {
    fn encode(&self, item: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(item).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// UTF-8 string codec; the bytes are the string itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringCodec;

impl StringCodec {
    /// Creates a new string codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec<String> for StringCodec {
    fn encode(&self, item: &String) -> Result<Vec<u8>, CodecError> {
        Ok(item.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
