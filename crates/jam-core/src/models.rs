//! Data models for collections, pages, selections and moves.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result, TransportError};

/// Stable identifier of a company record.
pub type CompanyId = i64;

/// Drop repeated ids, keeping the first occurrence of each in order.
pub fn dedup_ids(ids: impl IntoIterator<Item = CompanyId>) -> Vec<CompanyId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// =============================================================================
// RECORDS & COLLECTIONS
// =============================================================================

/// Opaque identifier of a collection in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for CollectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("invalid collection id '{}': {}", s, e)))
    }
}

/// A company record. Identity is `id`; this crate only changes membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub company_name: String,
    /// Set by membership in the liked list.
    #[serde(default)]
    pub liked: bool,
}

/// Collection metadata as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub id: CollectionId,
    pub collection_name: String,
}

/// Role of a collection, resolved once from its name when collections load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionRole {
    #[default]
    Default,
    MyList,
    Liked,
    /// Never offered as a source or destination.
    Ignored,
}

impl CollectionRole {
    /// Resolve a role from the store's display name.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            defaults::MY_LIST_NAME => Self::MyList,
            defaults::LIKED_LIST_NAME => Self::Liked,
            defaults::IGNORE_LIST_NAME => Self::Ignored,
            _ => Self::Default,
        }
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

impl fmt::Display for CollectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::MyList => write!(f, "my_list"),
            Self::Liked => write!(f, "liked"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

impl FromStr for CollectionRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default" => Ok(Self::Default),
            "my_list" | "mylist" => Ok(Self::MyList),
            "liked" => Ok(Self::Liked),
            "ignored" => Ok(Self::Ignored),
            _ => Err(Error::InvalidInput(format!("unknown collection role: {}", s))),
        }
    }
}

/// A collection with its role resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub role: CollectionRole,
}

impl From<CollectionMetadata> for Collection {
    fn from(meta: CollectionMetadata) -> Self {
        let role = CollectionRole::from_name(&meta.collection_name);
        Self {
            id: meta.id,
            name: meta.collection_name,
            role,
        }
    }
}

/// One page of a collection's membership plus the total member count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberPage {
    pub companies: Vec<Company>,
    pub total: u64,
}

// =============================================================================
// PAGE WINDOW & SELECTION
// =============================================================================

/// The slice of a collection currently materialized client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub collection_id: CollectionId,
    pub offset: usize,
    pub page_size: usize,
}

impl PageWindow {
    pub fn new(collection_id: CollectionId, offset: usize, page_size: usize) -> Self {
        Self {
            collection_id,
            offset,
            page_size,
        }
    }

    /// First page of a collection.
    pub fn first_page(collection_id: CollectionId, page_size: usize) -> Self {
        Self::new(collection_id, defaults::PAGE_OFFSET, page_size)
    }

    /// Window for a zero-based page number.
    pub fn for_page(collection_id: CollectionId, page: usize, page_size: usize) -> Self {
        Self::new(collection_id, page.saturating_mul(page_size), page_size)
    }

    /// Same page size on another collection; the offset always resets.
    pub fn switched_to(&self, collection_id: CollectionId) -> Self {
        Self::first_page(collection_id, self.page_size)
    }

    /// Zero-based page number this window starts on.
    pub fn page_index(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.offset / self.page_size
        }
    }
}

/// Company ids chosen from one page window.
///
/// A selection is only meaningful for the window it was made against: once
/// the viewed window differs, the selection reads as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    scope: Option<PageWindow>,
    ids: Vec<CompanyId>,
}

impl SelectionSet {
    /// Selection made against `scope`. Duplicates are dropped, first
    /// occurrence wins, order is otherwise preserved.
    pub fn new(scope: PageWindow, ids: impl IntoIterator<Item = CompanyId>) -> Self {
        Self {
            scope: Some(scope),
            ids: dedup_ids(ids),
        }
    }

    pub fn scope(&self) -> Option<&PageWindow> {
        self.scope.as_ref()
    }

    /// Ids still valid for `window`; empty when the selection was made
    /// against another window or collection.
    pub fn ids_for(&self, window: &PageWindow) -> &[CompanyId] {
        match &self.scope {
            Some(scope) if scope == window => &self.ids,
            _ => &[],
        }
    }

    pub fn is_valid_for(&self, window: &PageWindow) -> bool {
        !self.ids_for(window).is_empty()
    }

    /// Add or remove one id. Toggling against a different window starts a
    /// fresh selection on that window.
    pub fn toggle(&mut self, window: PageWindow, id: CompanyId) {
        if self.scope != Some(window) {
            *self = Self::new(window, []);
        }
        if let Some(pos) = self.ids.iter().position(|x| *x == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    pub fn invalidate(&mut self) {
        self.scope = None;
        self.ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

// =============================================================================
// MOVES
// =============================================================================

/// Which members of the source collection a move carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTargets {
    Selected(Vec<CompanyId>),
    All,
}

/// A single move invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub source: CollectionId,
    pub destination: Option<CollectionId>,
    pub targets: MoveTargets,
}

impl MoveRequest {
    /// Move of the given ids. Repeats are dropped; first occurrences keep
    /// their order.
    pub fn selected(
        source: CollectionId,
        destination: Option<CollectionId>,
        ids: impl IntoIterator<Item = CompanyId>,
    ) -> Self {
        Self {
            source,
            destination,
            targets: MoveTargets::Selected(dedup_ids(ids)),
        }
    }

    pub fn all(source: CollectionId, destination: Option<CollectionId>) -> Self {
        Self {
            source,
            destination,
            targets: MoveTargets::All,
        }
    }

    /// Check local preconditions and return the destination.
    pub fn validate(&self) -> Result<CollectionId> {
        let destination = self
            .destination
            .ok_or_else(|| Error::InvalidDestination("destination not defined".to_string()))?;
        if destination == self.source {
            return Err(Error::InvalidDestination(format!(
                "destination {} equals source",
                destination
            )));
        }
        if let MoveTargets::Selected(ids) = &self.targets {
            if ids.is_empty() {
                return Err(Error::EmptySelection);
            }
        }
        Ok(destination)
    }
}

/// Result of one chunk of a selected-ids move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The store accepted the chunk. `reported` is the count it claimed.
    Moved {
        index: usize,
        company_ids: Vec<CompanyId>,
        reported: usize,
    },
    Failed {
        index: usize,
        company_ids: Vec<CompanyId>,
        error: TransportError,
    },
    /// Never sent because an earlier chunk failed.
    NotIssued {
        index: usize,
        company_ids: Vec<CompanyId>,
    },
}

impl BatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Moved { index, .. } | Self::Failed { index, .. } | Self::NotIssued { index, .. } => {
                *index
            }
        }
    }

    pub fn company_ids(&self) -> &[CompanyId] {
        match self {
            Self::Moved { company_ids, .. }
            | Self::Failed { company_ids, .. }
            | Self::NotIssued { company_ids, .. } => company_ids,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Outcome of a fully successful move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub moved_count: usize,
    /// Per-chunk outcomes; empty for move-all.
    pub batches: Vec<BatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
