use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A caller's intent to execute a remote method, tagged with a
/// correlation id.
///
/// Each argument is pre-encoded by the active serializer; the record as
/// a whole round-trips through the same serializer on its way to the
/// wire. `id` is unique for the lifetime of the owning runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub id: u64,
    pub target_service: String,
    pub method: String,
    pub argument_types: Vec<String>,
    pub arguments: Vec<Vec<u8>>,
}

/// The remote outcome for a given invocation id: a payload on success,
/// a failure message otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub payload: Vec<u8>,
    pub failure: Option<String>,
}

impl Response {
    pub fn ok(id: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            payload,
            failure: None,
        }
    }

    pub fn failure(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            payload: Vec::new(),
            failure: Some(message.into()),
        }
    }

    /// Unwrap into the payload, or the remote failure carried instead.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.failure {
            Some(message) => Err(Error::Remote(message)),
            None => Ok(self.payload),
        }
    }
}
