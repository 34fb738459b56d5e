use async_trait::async_trait;

use lodestar_core::ServiceAddress;

use crate::error::Result;

pub mod tcp;

pub use self::tcp::{TcpConnector, TcpTransport, TcpTransportBuilder, TcpTransportListener};

/// Transport trait for exchanging framed payloads
///
/// Each transport instance represents a single connection. Send and
/// receive operate on whole payloads; framing is the transport's
/// concern, not the caller's.
#[async_trait]
pub trait Transport: Send {
    /// Send one payload over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive the next payload from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;

    /// Split into independently owned send and receive halves
    ///
    /// The halves share the connection's fate: closing the send half
    /// ends the receive half's stream.
    fn into_split(self: Box<Self>) -> (Box<dyn SendHalf>, Box<dyn ReceiveHalf>);
}

/// Write side of a split transport.
#[async_trait]
pub trait SendHalf: Send {
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Read side of a split transport.
#[async_trait]
pub trait ReceiveHalf: Send {
    async fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Dials new connections to provider addresses.
///
/// The connection pool is written against this seam, so tests can stand
/// up in-process endpoints in place of real sockets.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &ServiceAddress) -> Result<Box<dyn Transport>>;
}
