//! Lodestar Client - RPC client runtime
//!
//! Lets a caller invoke methods on remote provider processes as if they
//! were local. The runtime handles provider discovery through a registry
//! collaborator, connection pooling, load-balanced endpoint selection,
//! wire framing, and asynchronous request/response correlation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use lodestar_client::adapter::ServiceAdapter;
//! use lodestar_client::registry::Registry;
//! use lodestar_client::{ClientConfig, ClientRuntime};
//!
//! # async fn example(registry: Arc<dyn Registry>) -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = Arc::new(ClientRuntime::with_tcp(ClientConfig::default(), registry)?);
//! runtime.subscribe("demo.DataService").await?;
//! runtime.start()?;
//!
//! let adapter = ServiceAdapter::new(runtime.clone(), "demo.DataService")
//!     .with_timeout(Duration::from_secs(3));
//! let reply: String = adapter
//!     .call("sendData", adapter.args().push("hello"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod correlation;
pub mod error;
pub mod pool;
pub mod reconciler;
pub mod registry;
pub mod router;
pub mod runtime;

mod connection;
mod dispatch;

// Re-exports for convenience
pub use config::{ClientConfig, RouterKind, SerializerKind};
pub use error::{Error, Result};
pub use runtime::{CallHandle, ClientRuntime};
