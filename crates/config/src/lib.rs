//! Configuration loading for the hubgate proxy.
//!
//! Uses figment to layer built-in defaults, an optional YAML file, and
//! `HUBGATE_`-prefixed environment variables.

pub mod schema;

pub use schema::{Config, ENV_PREFIX, IdentityConfig, LogConfig, UpstreamConfig};
