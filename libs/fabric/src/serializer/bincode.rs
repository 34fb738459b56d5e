use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub(super) fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    ::bincode::serialize(value).map_err(|e| Error::Serializer(e.to_string()))
}

pub(super) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ::bincode::deserialize(bytes).map_err(|e| Error::Serializer(e.to_string()))
}
