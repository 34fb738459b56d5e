use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub(super) fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serializer(e.to_string()))
}

pub(super) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Serializer(e.to_string()))
}
