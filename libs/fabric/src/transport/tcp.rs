use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use lodestar_core::ServiceAddress;

use crate::codec::{encode_frame, FrameDecoder, DEFAULT_MAX_FRAME_LEN};
use crate::error::{Error, Result};
use crate::transport::{Connector, ReceiveHalf, SendHalf, Transport};

const READ_CHUNK: usize = 8 * 1024;

async fn write_frame<W>(writer: &mut W, bytes: &[u8], timeout: Option<Duration>) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let write_op = async {
        writer.write_all(&encode_frame(bytes)).await?;
        writer.flush().await?;
        Ok::<(), Error>(())
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, write_op)
            .await
            .map_err(|_| Error::Custom("Send timeout exceeded".to_string()))?,
        None => write_op.await,
    }
}

async fn read_frame<R>(
    reader: &mut R,
    decoder: &mut FrameDecoder,
    timeout: Option<Duration>,
) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + Send,
{
    let read_op = async {
        loop {
            if let Some(payload) = decoder.next_frame()? {
                return Ok(payload);
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            decoder.extend(&chunk[..n]);
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, read_op)
            .await
            .map_err(|_| Error::Custom("Receive timeout exceeded".to_string()))?,
        None => read_op.await,
    }
}

/// TCP transport with length-prefix framing
///
/// Payloads go out with a 4-byte big-endian length prefix and come back
/// through a resumable frame decoder, so arbitrary stream fragmentation
/// never tears a payload.
pub struct TcpTransport {
    stream: TcpStream,
    decoder: FrameDecoder,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Connect to a provider address with default settings
    pub async fn connect(address: &ServiceAddress) -> Result<Self> {
        Self::builder().address(address.clone()).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::default(),
            send_timeout: None,
            receive_timeout: None,
        }
    }

    /// Get the remote address of this connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream.peer_addr().map_err(Into::into)
    }

    /// Get the local address of this connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr().map_err(Into::into)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        write_frame(&mut self.stream, bytes, self.send_timeout).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.stream, &mut self.decoder, self.receive_timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    fn into_split(self: Box<Self>) -> (Box<dyn SendHalf>, Box<dyn ReceiveHalf>) {
        let (reader, writer) = self.stream.into_split();
        (
            Box::new(TcpSendHalf {
                writer,
                send_timeout: self.send_timeout,
            }),
            Box::new(TcpReceiveHalf {
                reader,
                decoder: self.decoder,
                receive_timeout: self.receive_timeout,
            }),
        )
    }
}

/// Write side of a split TCP connection.
pub struct TcpSendHalf {
    writer: OwnedWriteHalf,
    send_timeout: Option<Duration>,
}

#[async_trait]
impl SendHalf for TcpSendHalf {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        write_frame(&mut self.writer, bytes, self.send_timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Read side of a split TCP connection.
pub struct TcpReceiveHalf {
    reader: OwnedReadHalf,
    decoder: FrameDecoder,
    receive_timeout: Option<Duration>,
}

#[async_trait]
impl ReceiveHalf for TcpReceiveHalf {
    async fn receive(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.reader, &mut self.decoder, self.receive_timeout).await
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

/// Builder for configuring TCP transport
#[derive(Default)]
pub struct TcpTransportBuilder {
    address: Option<ServiceAddress>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_frame_len: Option<usize>,
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider address to connect to
    pub fn address(mut self, address: ServiceAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Set the upper bound on a single inbound frame
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = Some(len);
        self
    }

    /// Connect with the configured settings
    pub async fn connect(self) -> Result<TcpTransport> {
        let address = self
            .address
            .ok_or_else(|| Error::Custom("Address not set".to_string()))?;

        let connect_op = TcpStream::connect((address.host.as_str(), address.port));

        let stream = if let Some(timeout) = self.connect_timeout {
            tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| Error::Custom("Connect timeout exceeded".to_string()))??
        } else {
            connect_op.await?
        };

        Ok(TcpTransport {
            stream,
            decoder: FrameDecoder::new(self.max_frame_len.unwrap_or(DEFAULT_MAX_FRAME_LEN)),
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
        })
    }
}

/// Default dialer used by the connection pool.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    pub connect_timeout: Option<Duration>,
    pub max_frame_len: usize,
}

impl TcpConnector {
    pub fn new(connect_timeout: Option<Duration>, max_frame_len: usize) -> Self {
        Self {
            connect_timeout,
            max_frame_len,
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &ServiceAddress) -> Result<Box<dyn Transport>> {
        let mut builder = TcpTransport::builder()
            .address(address.clone())
            .max_frame_len(self.max_frame_len);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Box::new(builder.connect().await?))
    }
}
