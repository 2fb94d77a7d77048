//! Bearer credential management for the time-series service.
//!
//! [`client_credentials`] performs the OAuth 2.0 client-credentials exchange;
//! [`CredentialCache`] keeps the resulting token and coordinates refreshes
//! across concurrent callers.

pub mod cache;
pub mod client_credentials;

pub use cache::{CredentialCache, REFRESH_MARGIN};
pub use client_credentials::ClientCredentials;
