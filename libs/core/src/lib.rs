//! Lodestar Core - shared data model for the RPC client runtime
//!
//! Defines the wire records exchanged with providers (`Invocation`,
//! `Response`), the identity types used by discovery and routing
//! (`ServiceAddress`, `ServiceUrl`), and the caller-visible failure
//! taxonomy.

pub mod address;
pub mod error;
pub mod message;
pub mod url;

// Re-exports for convenience
pub use address::ServiceAddress;
pub use error::{Error, Result};
pub use message::{Invocation, Response};
pub use url::ServiceUrl;
