//! # jam-workflow
//!
//! Browsing and moving collection members against a remote store.
//!
//! This crate provides:
//! - `PaginatedMembershipView`, a server-paginated page window where the
//!   latest triggered load always wins
//! - `BatchMoveCoordinator`, chunked fail-fast moves with partial-failure
//!   reporting and an observable move state
//! - `CollectionSession`, role-based collection discovery and destinations
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jam_client::HttpCollectionClient;
//! use jam_workflow::{CollectionSession, WorkflowConfig};
//!
//! let client = Arc::new(HttpCollectionClient::from_env()?);
//! let session = CollectionSession::open(client, WorkflowConfig::from_env()).await?;
//!
//! session.select([12, 7, 31]).await;
//! let outcome = session.move_selection().await?;
//! println!("moved {}", outcome.moved_count);
//! ```

pub mod batching;
pub mod config;
pub mod coordinator;
pub mod session;
pub mod view;

pub use batching::{dispatch, partition, BatchStrategy, DispatchReport};
pub use config::WorkflowConfig;
pub use coordinator::{BatchMoveCoordinator, MoveState};
pub use session::CollectionSession;
pub use view::{LoadOutcome, PageSnapshot, PaginatedMembershipView};
