//! Server-paginated window over one collection's membership.
//!
//! Every load is stamped with a generation when it is triggered. A response
//! is applied only if no later load was triggered in the meantime, so an
//! early request that answers late never overwrites a newer page.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use jam_core::{
    CollectionId, Company, Error, PageWindow, RemoteCollectionClient, Result,
};

/// Point-in-time copy of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Window most recently requested.
    pub window: PageWindow,
    /// Window the rows below were fetched for; `None` before the first
    /// successful load.
    pub loaded: Option<PageWindow>,
    pub companies: Vec<Company>,
    pub total: u64,
    pub fetching: bool,
    /// Generation of the load that produced the rows.
    pub generation: u64,
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was the latest and is now shown.
    Applied(PageSnapshot),
    /// A later load was triggered before this one answered; its response
    /// was dropped.
    Superseded { generation: u64, latest: u64 },
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Debug)]
struct ViewState {
    window: PageWindow,
    loaded: Option<PageWindow>,
    companies: Vec<Company>,
    total: u64,
    fetching: bool,
    applied: u64,
}

impl ViewState {
    fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            window: self.window,
            loaded: self.loaded,
            companies: self.companies.clone(),
            total: self.total,
            fetching: self.fetching,
            generation: self.applied,
        }
    }
}

/// Paginated membership view backed by a remote collection store.
pub struct PaginatedMembershipView<C> {
    client: Arc<C>,
    state: Arc<RwLock<ViewState>>,
    latest: Arc<AtomicU64>,
}

impl<C> Clone for PaginatedMembershipView<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
            latest: self.latest.clone(),
        }
    }
}

impl<C: RemoteCollectionClient> PaginatedMembershipView<C> {
    /// Create a view positioned on `window`. Nothing is fetched until the
    /// first load.
    pub fn new(client: Arc<C>, window: PageWindow) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(ViewState {
                window,
                loaded: None,
                companies: Vec::new(),
                total: 0,
                fetching: false,
                applied: 0,
            })),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn window(&self) -> PageWindow {
        self.state.read().await.window
    }

    pub async fn collection_id(&self) -> CollectionId {
        self.state.read().await.window.collection_id
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn is_fetching(&self) -> bool {
        self.state.read().await.fetching
    }

    /// Generation of the most recently triggered load.
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Fetch `window` and show it, unless a later load overtakes it.
    ///
    /// On failure the previously shown rows stay in place and the fetching
    /// flag is cleared. A failure of a superseded load is not reported.
    pub async fn load(&self, window: PageWindow) -> Result<LoadOutcome> {
        if window.page_size == 0 {
            return Err(Error::InvalidInput("page size must be positive".to_string()));
        }

        let generation = {
            let mut state = self.state.write().await;
            let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.window = window;
            state.fetching = true;
            generation
        };

        debug!(
            collection_id = %window.collection_id,
            offset = window.offset,
            page_size = window.page_size,
            generation,
            "Loading page"
        );

        let result = self
            .client
            .list_members(window.collection_id, window.offset, window.page_size)
            .await;

        let mut state = self.state.write().await;
        let latest = self.latest.load(Ordering::SeqCst);
        if generation != latest {
            warn!(
                collection_id = %window.collection_id,
                generation,
                latest,
                "Discarding stale page load"
            );
            return Ok(LoadOutcome::Superseded { generation, latest });
        }

        state.fetching = false;
        match result {
            Ok(page) => {
                debug!(
                    collection_id = %window.collection_id,
                    generation,
                    returned = page.companies.len(),
                    total = page.total,
                    "Page applied"
                );
                state.companies = page.companies;
                state.total = page.total;
                state.loaded = Some(window);
                state.applied = generation;
                Ok(LoadOutcome::Applied(state.snapshot()))
            }
            Err(e) => {
                warn!(
                    collection_id = %window.collection_id,
                    generation,
                    error = %e,
                    "Page load failed, keeping previous rows"
                );
                Err(e.into())
            }
        }
    }

    /// Re-fetch the current window.
    pub async fn reload(&self) -> Result<LoadOutcome> {
        let window = self.window().await;
        self.load(window).await
    }

    /// Move to a new offset and page size on the current collection.
    pub async fn set_window(&self, offset: usize, page_size: usize) -> Result<LoadOutcome> {
        let current = self.window().await;
        self.load(PageWindow::new(current.collection_id, offset, page_size)).await
    }

    /// Move to a zero-based page, keeping the page size.
    pub async fn set_page(&self, page: usize) -> Result<LoadOutcome> {
        let current = self.window().await;
        self.load(PageWindow::for_page(
            current.collection_id,
            page,
            current.page_size,
        ))
        .await
    }

    /// Show another collection from its first page.
    pub async fn switch_collection(&self, collection_id: CollectionId) -> Result<LoadOutcome> {
        let current = self.window().await;
        self.load(current.switched_to(collection_id)).await
    }
}
