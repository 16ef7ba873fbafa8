//! # jam-client
//!
//! Client for the remote collection store.
//!
//! This crate provides:
//! - `HttpCollectionClient`, the reqwest implementation of
//!   `jam_core::RemoteCollectionClient`
//! - Environment-driven `ClientConfig`
//! - `MockCollectionClient`, an in-memory store (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use jam_client::HttpCollectionClient;
//! use jam_core::RemoteCollectionClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpCollectionClient::from_env().unwrap();
//!     let collections = client.list_collections().await.unwrap();
//! }
//! ```

pub mod config;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{ClientConfig, ConfigError, ConfigResult};
pub use http::HttpCollectionClient;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockCollectionClient};
