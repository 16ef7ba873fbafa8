//! Error types for jam collection moves.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BatchOutcome, CompanyId};

/// Result type alias using jam's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for calls made against the remote collection store.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Core error type for jam operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Destination collection is missing or equals the source
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Nothing was selected for a move
    #[error("No companies selected")]
    EmptySelection,

    /// A single remote call failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Some chunks moved before a remote failure aborted the rest
    #[error(transparent)]
    PartialMove(Box<PartialMoveFailure>),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for rejections detected locally, before any remote call was made.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidDestination(_) | Error::EmptySelection | Error::InvalidInput(_)
        )
    }

    /// Number of companies that did move before the error, if known.
    pub fn moved_count(&self) -> usize {
        match self {
            Error::PartialMove(failure) => failure.moved_count,
            _ => 0,
        }
    }
}

impl From<PartialMoveFailure> for Error {
    fn from(failure: PartialMoveFailure) -> Self {
        Error::PartialMove(Box::new(failure))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Remote store operation that a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCall {
    ListCollections,
    ListMembers,
    MoveBatch,
    MoveAll,
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListCollections => write!(f, "list_collections"),
            Self::ListMembers => write!(f, "list_members"),
            Self::MoveBatch => write!(f, "move_batch"),
            Self::MoveAll => write!(f, "move_all"),
        }
    }
}

/// A failed remote call: network error, timeout, non-success status or an
/// undecodable response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    /// Which remote operation failed.
    pub call: RemoteCall,
    /// Zero-based chunk index when the call was one batch of a larger move.
    pub batch_index: Option<usize>,
    /// HTTP status, when the store answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(call: RemoteCall, message: impl Into<String>) -> Self {
        Self {
            call,
            batch_index: None,
            status: None,
            message: message.into(),
        }
    }

    /// Attach the HTTP status the store answered with.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the chunk index of the batch this call carried.
    pub fn with_batch_index(mut self, index: usize) -> Self {
        self.batch_index = Some(index);
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport error in {}", self.call)?;
        if let Some(index) = self.batch_index {
            write!(f, " (batch {})", index + 1)?;
        }
        if let Some(status) = self.status {
            write!(f, " [status {}]", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// Report for a chunked move that stopped after a remote failure.
///
/// `not_moved` lists, in selection order, every id from the failing chunk and
/// from all chunks that were never issued. Retrying means calling the move
/// again with exactly these ids.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Move partially failed: {moved_count} moved, {} not moved ({cause})",
    .not_moved.len()
)]
pub struct PartialMoveFailure {
    pub moved_count: usize,
    pub not_moved: Vec<CompanyId>,
    /// Per-chunk outcomes in chunk order.
    pub batches: Vec<BatchOutcome>,
    /// The first transport failure, which aborted remaining chunks.
    pub cause: TransportError,
}
