//! # jam-core
//!
//! Core types, traits, and abstractions for moving companies between
//! collections of a remote store.
//!
//! This crate provides the data model, the error taxonomy and the
//! `RemoteCollectionClient` trait that the other jam crates depend on.

pub mod collections;
pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use collections::CollectionDirectory;
pub use error::{Error, PartialMoveFailure, RemoteCall, Result, TransportError, TransportResult};
pub use models::*;
pub use traits::*;
