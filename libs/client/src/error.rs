use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported router variant: {0}")]
    UnsupportedRouter(String),

    #[error("unsupported serializer variant: {0}")]
    UnsupportedSerializer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("runtime already started")]
    AlreadyStarted,

    #[error("runtime is shutting down")]
    ShuttingDown,

    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Call(#[from] lodestar_core::Error),

    #[error(transparent)]
    Fabric(#[from] lodestar_fabric::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
