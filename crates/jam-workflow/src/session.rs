//! A browsing session over the store's selectable collections.
//!
//! Ties the collection directory, the paginated view and the move
//! coordinator together, and picks move destinations by collection role.

use std::sync::Arc;

use tracing::{info, warn};

use jam_core::{
    Collection, CollectionDirectory, CollectionId, CollectionRole, CompanyId, Error, MoveOutcome,
    PageWindow, RemoteCollectionClient, Result,
};

use crate::config::WorkflowConfig;
use crate::coordinator::BatchMoveCoordinator;
use crate::view::{LoadOutcome, PaginatedMembershipView};

pub struct CollectionSession<C> {
    directory: CollectionDirectory,
    coordinator: BatchMoveCoordinator<C>,
    config: WorkflowConfig,
}

impl<C: RemoteCollectionClient> CollectionSession<C> {
    /// List collections, resolve their roles and show the first page of the
    /// first selectable one.
    ///
    /// A failed first page load is logged and left for a later reload; only
    /// a failed collection listing fails the session.
    pub async fn open(client: Arc<C>, config: WorkflowConfig) -> Result<Self> {
        config.validate()?;

        let directory = CollectionDirectory::resolve(client.list_collections().await?);
        let initial = directory
            .initial()
            .map(|c| c.id)
            .ok_or_else(|| Error::InvalidInput("store has no selectable collections".to_string()))?;

        let view = PaginatedMembershipView::new(
            client.clone(),
            PageWindow::first_page(initial, config.page_size),
        );
        let coordinator = BatchMoveCoordinator::new(client, view, &config);

        if let Err(e) = coordinator.view().reload().await {
            warn!(collection_id = %initial, error = %e, "Initial page load failed");
        }

        info!(
            collection_count = directory.len(),
            collection_id = %initial,
            "Session opened"
        );

        Ok(Self {
            directory,
            coordinator,
            config,
        })
    }

    pub fn directory(&self) -> &CollectionDirectory {
        &self.directory
    }

    pub fn view(&self) -> &PaginatedMembershipView<C> {
        self.coordinator.view()
    }

    pub fn coordinator(&self) -> &BatchMoveCoordinator<C> {
        &self.coordinator
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Find a selectable collection by role name or id.
    pub fn lookup(&self, key: &str) -> Result<&Collection> {
        let found = match key.parse::<CollectionRole>() {
            Ok(role) => self.directory.by_role(role),
            Err(_) => self.directory.get(key.parse::<CollectionId>()?),
        };
        found.ok_or_else(|| Error::InvalidInput(format!("no selectable collection '{}'", key)))
    }

    /// Collection currently on view.
    pub async fn current(&self) -> Option<&Collection> {
        let id = self.view().collection_id().await;
        self.directory.get(id)
    }

    /// Show a selectable collection from its first page.
    pub async fn switch_to(&self, collection_id: CollectionId) -> Result<LoadOutcome> {
        if self.directory.get(collection_id).is_none() {
            return Err(Error::InvalidInput(format!(
                "collection {} is not selectable",
                collection_id
            )));
        }
        self.coordinator.switch_collection(collection_id).await
    }

    pub async fn switch_to_role(&self, role: CollectionRole) -> Result<LoadOutcome> {
        let id = self
            .directory
            .by_role(role)
            .map(|c| c.id)
            .ok_or_else(|| Error::InvalidInput(format!("no selectable {} collection", role)))?;
        self.coordinator.switch_collection(id).await
    }

    /// Destination for moves out of the collection on view.
    pub async fn destination(&self) -> Option<CollectionId> {
        let source = self.view().collection_id().await;
        self.directory.destination_for(source)
    }

    pub async fn select(&self, ids: impl IntoIterator<Item = CompanyId>) {
        self.coordinator.select(ids).await;
    }

    /// Show a zero-based page at the configured page size.
    pub async fn set_page(&self, page: usize) -> Result<LoadOutcome> {
        let page_size = self.view().window().await.page_size;
        self.coordinator
            .set_window(page.saturating_mul(page_size), page_size)
            .await
    }

    /// Move the current selection to the policy destination.
    pub async fn move_selection(&self) -> Result<MoveOutcome> {
        let destination = self.destination().await;
        self.coordinator.move_selection(destination).await
    }

    /// Move every member of the collection on view to the policy destination.
    pub async fn move_all(&self) -> Result<MoveOutcome> {
        let source = self.view().collection_id().await;
        let destination = self.directory.destination_for(source);
        self.coordinator.move_all(source, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_client::mock::MockCollectionClient;
    use jam_core::{defaults, RemoteCall};

    struct Fixture {
        store: Arc<MockCollectionClient>,
        my_list: CollectionId,
        liked: CollectionId,
        ignored: CollectionId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockCollectionClient::new());
        let ignored = store.add_collection(defaults::IGNORE_LIST_NAME, [90, 91]);
        let my_list = store.add_collection(defaults::MY_LIST_NAME, 1..=30);
        let liked = store.add_collection(defaults::LIKED_LIST_NAME, []);
        Fixture {
            store,
            my_list,
            liked,
            ignored,
        }
    }

    #[tokio::test]
    async fn test_open_skips_ignore_list() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        assert_eq!(session.directory().len(), 2);
        assert_eq!(session.current().await.map(|c| c.id), Some(f.my_list));
        let snapshot = session.view().snapshot().await;
        assert_eq!(snapshot.companies.len(), 25);
        assert_eq!(snapshot.total, 30);
    }

    #[tokio::test]
    async fn test_open_survives_failed_first_page() {
        let f = fixture();
        f.store.fail_nth(RemoteCall::ListMembers, 0);

        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        let snapshot = session.view().snapshot().await;
        assert!(snapshot.loaded.is_none());
        assert!(!snapshot.fetching);
    }

    #[tokio::test]
    async fn test_open_fails_when_listing_fails() {
        let f = fixture();
        f.store.fail_always(RemoteCall::ListCollections);
        let result = CollectionSession::open(f.store.clone(), WorkflowConfig::default()).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let f = fixture();
        let config = WorkflowConfig::default().with_batch_size(0);
        let result = CollectionSession::open(f.store.clone(), config).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(f.store.call_count(RemoteCall::ListCollections), 0);
    }

    #[tokio::test]
    async fn test_open_without_selectable_collections() {
        let store = Arc::new(MockCollectionClient::new());
        store.add_collection(defaults::IGNORE_LIST_NAME, [1]);
        let result = CollectionSession::open(store, WorkflowConfig::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_destination_follows_role() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        assert_eq!(session.destination().await, Some(f.liked));
        session.switch_to_role(CollectionRole::Liked).await.unwrap();
        assert_eq!(session.destination().await, Some(f.my_list));
    }

    #[tokio::test]
    async fn test_switch_to_ignored_collection_is_rejected() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        assert!(matches!(
            session.switch_to(f.ignored).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(session.switch_to_role(CollectionRole::Ignored).await.is_err());
        assert_eq!(session.current().await.map(|c| c.id), Some(f.my_list));
    }

    #[tokio::test]
    async fn test_lookup_by_role_or_id() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        assert_eq!(session.lookup("liked").unwrap().id, f.liked);
        assert_eq!(session.lookup("my-list").unwrap().id, f.my_list);
        assert_eq!(session.lookup(&f.liked.to_string()).unwrap().id, f.liked);
        assert!(session.lookup(&f.ignored.to_string()).is_err());
        assert!(session.lookup("nonsense").is_err());
    }

    #[tokio::test]
    async fn test_move_selection_to_liked_and_back() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        session.select([2, 4]).await;
        let outcome = session.move_selection().await.unwrap();
        assert_eq!(outcome.moved_count, 2);
        assert_eq!(f.store.members(f.liked), vec![2, 4]);
        assert_eq!(session.view().snapshot().await.total, 28);

        session.switch_to(f.liked).await.unwrap();
        session.select([4]).await;
        session.move_selection().await.unwrap();
        assert_eq!(f.store.members(f.liked), vec![2]);
        assert!(f.store.members(f.my_list).contains(&4));
    }

    #[tokio::test]
    async fn test_move_all_uses_policy_destination() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        let outcome = session.move_all().await.unwrap();
        assert_eq!(outcome.moved_count, 30);
        assert!(outcome.batches.is_empty());
        assert!(f.store.members(f.my_list).is_empty());
        assert_eq!(session.view().snapshot().await.total, 0);
    }

    #[tokio::test]
    async fn test_move_without_liked_collection_is_invalid_destination() {
        let store = Arc::new(MockCollectionClient::new());
        store.add_collection(defaults::MY_LIST_NAME, [1, 2]);
        let session = CollectionSession::open(store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        session.select([1]).await;
        let err = session.move_selection().await.unwrap_err();
        assert!(matches!(err, Error::InvalidDestination(_)));
        assert_eq!(store.call_count(RemoteCall::MoveBatch), 0);
    }

    #[tokio::test]
    async fn test_set_page_clears_selection() {
        let f = fixture();
        let session = CollectionSession::open(f.store.clone(), WorkflowConfig::default())
            .await
            .unwrap();

        session.select([1, 2]).await;
        session.set_page(1).await.unwrap();

        assert!(session.coordinator().selected().await.is_empty());
        let window = session.view().window().await;
        assert_eq!(window.offset, 25);
        assert_eq!(session.view().snapshot().await.companies.len(), 5);
    }
}
