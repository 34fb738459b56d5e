use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

mod bincode;
mod json;

/// Payload serialization strategy.
///
/// Exactly one variant is active per process, chosen at startup; both
/// ends of a connection must agree on it. Mixing variants between
/// communicating endpoints is a configuration error, not something
/// negotiated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serializer {
    /// Compact binary encoding.
    Bincode,
    /// Self-describing JSON encoding.
    Json,
}

impl Serializer {
    /// Encode a record into bytes.
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Self::Bincode => bincode::serialize(value),
            Self::Json => json::serialize(value),
        }
    }

    /// Decode a record from bytes.
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Self::Bincode => bincode::deserialize(bytes),
            Self::Json => json::deserialize(bytes),
        }
    }
}
