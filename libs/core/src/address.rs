use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Network location of one provider instance.
///
/// Compared by value; two addresses are the same provider exactly when
/// host and port match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub host: String,
    pub port: u16,
}

impl ServiceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServiceAddress {
    type Err = Error;

    /// Parse a registry-style `"host:port"` string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::custom(format!("invalid provider address: {s}")))?;
        let port = port
            .parse()
            .map_err(|_| Error::custom(format!("invalid port in provider address: {s}")))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}
