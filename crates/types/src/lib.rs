//! Core types and traits for the hubgate workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! time-series proxy: the error taxonomy, the cached credential, the result
//! records handed back to field accessors, and the async traits that the
//! auth and upstream layers implement.

pub mod error;
pub mod result;
pub mod token;
pub mod traits;

pub use error::{HubError, UpstreamHttpError};
pub use result::{Payload, ProxyResult};
pub use token::Credential;
pub use traits::{BodyKind, TokenProvider, UpstreamInvoker, UpstreamResponse};
