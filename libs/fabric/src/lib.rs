//! Lodestar Fabric - wire layer for the RPC client runtime
//!
//! Provides length-prefix framing (`codec`), pluggable payload
//! serialization (`serializer`), and transport abstractions (`transport`)
//! for talking to service providers.
//!
//! # Example
//!
//! ```no_run
//! use lodestar_core::ServiceAddress;
//! use lodestar_fabric::serializer::Serializer;
//! use lodestar_fabric::transport::{TcpTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let address = ServiceAddress::new("10.0.0.1", 9000);
//! let mut transport = TcpTransport::connect(&address).await?;
//!
//! let serializer = Serializer::Bincode;
//! let payload = serializer.serialize(&"hello")?;
//! transport.send(&payload).await?;
//! let reply: String = serializer.deserialize(&transport.receive().await?)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod serializer;
pub mod transport;

// Re-exports for convenience
pub use error::{Error, Result};
pub use serializer::Serializer;
