//! Runtime configuration.
//!
//! Variant selection is a closed enumeration resolved when the
//! configuration is parsed; an unmatched name is a configuration error
//! surfaced before the runtime exists, never a runtime fault.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lodestar_fabric::codec::DEFAULT_MAX_FRAME_LEN;

use crate::error::Error;

/// Router variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouterKind {
    Random,
    RoundRobin,
}

impl FromStr for RouterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "round-robin" => Ok(Self::RoundRobin),
            other => Err(Error::UnsupportedRouter(other.to_string())),
        }
    }
}

/// Serializer variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerializerKind {
    Bincode,
    Json,
}

impl FromStr for SerializerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bincode" => Ok(Self::Bincode),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedSerializer(other.to_string())),
        }
    }
}

/// Client runtime configuration, loaded by the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub application_name: String,
    pub router: RouterKind,
    pub serializer: SerializerKind,
    /// Host advertised to the registry alongside subscriptions.
    pub advertised_host: Option<String>,
    /// Upper bound on a single wire frame.
    pub max_frame_len: usize,
    /// Outgoing invocation queue capacity.
    pub dispatch_queue_depth: usize,
    /// Deadline applied when a call does not carry its own.
    pub default_timeout: Duration,
    /// Timeout when dialing providers.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_name: "lodestar-client".to_string(),
            router: RouterKind::Random,
            serializer: SerializerKind::Bincode,
            advertised_host: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            dispatch_queue_depth: 1024,
            default_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}
