use thiserror::Error;

/// Failures a caller can observe through a call handle.
///
/// Network and connection errors stay local to the affected service's
/// connections; they reach the caller only through this taxonomy, never
/// as an uncaught fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no available provider for service '{service}'")]
    NoAvailableProvider { service: String },

    #[error("call timed out")]
    Timeout,

    #[error("connection lost")]
    ConnectionLost,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("remote failure: {0}")]
    Remote(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn no_available_provider(service: impl Into<String>) -> Self {
        Self::NoAvailableProvider {
            service: service.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
