//! Typed caller-facing stubs.
//!
//! A service contract is a hand-written wrapper over `ServiceAdapter`:
//! each stub method encodes its arguments, invokes through the runtime,
//! and decodes the reply payload. No runtime reflection is involved —
//! the mapping from method signature to invocation record is spelled
//! out in the stub.

use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use lodestar_fabric::serializer::Serializer;

use crate::error::Result;
use crate::runtime::ClientRuntime;

/// Stub-side glue binding one service name to a runtime.
pub struct ServiceAdapter {
    runtime: Arc<ClientRuntime>,
    service: String,
    timeout: Option<Duration>,
}

impl ServiceAdapter {
    pub fn new(runtime: Arc<ClientRuntime>, service: impl Into<String>) -> Self {
        Self {
            runtime,
            service: service.into(),
            timeout: None,
        }
    }

    /// Apply a per-call deadline instead of the runtime default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Start an argument list for a call.
    pub fn args(&self) -> ArgList {
        ArgList {
            serializer: self.runtime.serializer(),
            types: Vec::new(),
            values: Vec::new(),
            error: None,
        }
    }

    /// Invoke `method` and decode the reply payload as `R`.
    pub async fn call<R: DeserializeOwned>(&self, method: &str, args: ArgList) -> Result<R> {
        if let Some(e) = args.error {
            return Err(e.into());
        }

        let response = self
            .runtime
            .invoke_blocking(&self.service, method, args.types, args.values, self.timeout)
            .await?;
        let payload = response.into_result()?;
        let value = self.runtime.serializer().deserialize(&payload)?;
        Ok(value)
    }
}

/// Serializer-encoded argument list under construction.
///
/// Encoding failures are held until `call`, so stub methods can chain
/// `push` without handling errors at every step.
pub struct ArgList {
    serializer: Serializer,
    types: Vec<String>,
    values: Vec<Vec<u8>>,
    error: Option<lodestar_fabric::Error>,
}

impl ArgList {
    /// Append one argument, recording its type name alongside the
    /// encoded value.
    pub fn push<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.serializer.serialize(value) {
            Ok(bytes) => {
                self.types.push(type_name::<T>().to_string());
                self.values.push(bytes);
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
