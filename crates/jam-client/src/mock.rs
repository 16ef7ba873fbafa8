//! In-memory collection store for deterministic testing.
//!
//! Records every call, and can fail or delay the n-th invocation of any
//! remote operation.
//!
//! ## Usage
//!
//! ```rust
//! use jam_client::mock::MockCollectionClient;
//! use jam_core::{RemoteCall, RemoteCollectionClient};
//!
//! # tokio_test_block(async {
//! let store = MockCollectionClient::new();
//! let my_list = store.add_collection("My List", 1..=5);
//! let liked = store.add_collection("Liked Companies List", []);
//! store.fail_nth(RemoteCall::MoveBatch, 1);
//!
//! store.move_batch(my_list, liked, &[1, 2]).await.unwrap();
//! assert!(store.move_batch(my_list, liked, &[3]).await.is_err());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f);
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use jam_core::{
    defaults, CollectionId, CollectionMetadata, Company, CompanyId, MemberPage, RemoteCall,
    RemoteCollectionClient, TransportError, TransportResult,
};

/// A call received by the mock store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListCollections,
    ListMembers {
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    },
    MoveBatch {
        source: CollectionId,
        destination: CollectionId,
        company_ids: Vec<CompanyId>,
    },
    MoveAll {
        source: CollectionId,
        destination: CollectionId,
    },
}

#[derive(Default)]
struct MockStore {
    collections: Vec<CollectionMetadata>,
    members: HashMap<CollectionId, Vec<CompanyId>>,
    calls: Vec<MockCall>,
    counts: HashMap<RemoteCall, usize>,
    failures: HashSet<(RemoteCall, usize)>,
    always_fail: HashSet<RemoteCall>,
    delays: HashMap<(RemoteCall, usize), Duration>,
}

impl MockStore {
    /// Record a call and return its zero-based invocation number.
    fn record(&mut self, op: RemoteCall, call: MockCall) -> usize {
        self.calls.push(call);
        let count = self.counts.entry(op).or_insert(0);
        let nth = *count;
        *count += 1;
        nth
    }

    fn check_failure(&self, op: RemoteCall, nth: usize) -> TransportResult<()> {
        if self.always_fail.contains(&op) || self.failures.contains(&(op, nth)) {
            return Err(TransportError::new(op, "injected failure").with_status(500));
        }
        Ok(())
    }

    fn liked_ids(&self) -> HashSet<CompanyId> {
        self.collections
            .iter()
            .filter(|c| c.collection_name == defaults::LIKED_LIST_NAME)
            .filter_map(|c| self.members.get(&c.id))
            .flatten()
            .copied()
            .collect()
    }

    fn not_found(&self, op: RemoteCall, id: CollectionId) -> TransportError {
        TransportError::new(op, format!("collection {} not found", id)).with_status(404)
    }

    fn transfer(
        &mut self,
        op: RemoteCall,
        source: CollectionId,
        destination: CollectionId,
        ids: Option<&[CompanyId]>,
    ) -> TransportResult<usize> {
        if !self.members.contains_key(&destination) {
            return Err(self.not_found(op, destination));
        }
        let source_members = self
            .members
            .get_mut(&source)
            .ok_or_else(|| TransportError::new(op, "source not found").with_status(404))?;

        let moving: Vec<CompanyId> = match ids {
            Some(ids) => source_members
                .iter()
                .copied()
                .filter(|id| ids.contains(id))
                .collect(),
            None => source_members.clone(),
        };
        source_members.retain(|id| !moving.contains(id));

        let dest_members = self.members.entry(destination).or_default();
        let mut moved = 0;
        for id in moving {
            if !dest_members.contains(&id) {
                dest_members.push(id);
                moved += 1;
            }
        }
        Ok(moved)
    }
}

/// Mock collection store for testing.
#[derive(Clone, Default)]
pub struct MockCollectionClient {
    store: Arc<Mutex<MockStore>>,
}

impl MockCollectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a collection holding `ids`; companies are named "Company {id}".
    pub fn add_collection(
        &self,
        name: &str,
        ids: impl IntoIterator<Item = CompanyId>,
    ) -> CollectionId {
        let id = CollectionId::new_v4();
        let mut store = self.lock();
        store.collections.push(CollectionMetadata {
            id,
            collection_name: name.to_string(),
        });
        store.members.insert(id, ids.into_iter().collect());
        id
    }

    /// Fail the `nth` (zero-based) invocation of `op` with status 500.
    pub fn fail_nth(&self, op: RemoteCall, nth: usize) {
        self.lock().failures.insert((op, nth));
    }

    /// Fail every invocation of `op`.
    pub fn fail_always(&self, op: RemoteCall) {
        self.lock().always_fail.insert(op);
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: RemoteCall) {
        let mut store = self.lock();
        store.always_fail.remove(&op);
        store.failures.retain(|(failing, _)| *failing != op);
    }

    /// Delay the response of the `nth` invocation of `op`.
    pub fn delay_nth(&self, op: RemoteCall, nth: usize, delay: Duration) {
        self.lock().delays.insert((op, nth), delay);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Id lists of every move-batch call, in call order.
    pub fn move_batch_calls(&self) -> Vec<Vec<CompanyId>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::MoveBatch { company_ids, .. } => Some(company_ids.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self, op: RemoteCall) -> usize {
        self.lock().counts.get(&op).copied().unwrap_or(0)
    }

    pub fn members(&self, collection_id: CollectionId) -> Vec<CompanyId> {
        self.lock()
            .members
            .get(&collection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the call, then apply any injected delay and failure.
    async fn begin(&self, op: RemoteCall, call: MockCall) -> TransportResult<()> {
        let (nth, delay) = {
            let mut store = self.lock();
            let nth = store.record(op, call);
            (nth, store.delays.get(&(op, nth)).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.lock().check_failure(op, nth)
    }
}

#[async_trait]
impl RemoteCollectionClient for MockCollectionClient {
    async fn list_collections(&self) -> TransportResult<Vec<CollectionMetadata>> {
        self.begin(RemoteCall::ListCollections, MockCall::ListCollections).await?;
        Ok(self.lock().collections.clone())
    }

    async fn list_members(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> TransportResult<MemberPage> {
        let op = RemoteCall::ListMembers;
        self.begin(
            op,
            MockCall::ListMembers {
                collection_id,
                offset,
                limit,
            },
        )
        .await?;

        let store = self.lock();
        let members = store
            .members
            .get(&collection_id)
            .ok_or_else(|| store.not_found(op, collection_id))?;
        let liked = store.liked_ids();
        let companies = members
            .iter()
            .skip(offset)
            .take(limit)
            .map(|id| Company {
                id: *id,
                company_name: format!("Company {}", id),
                liked: liked.contains(id),
            })
            .collect();

        Ok(MemberPage {
            companies,
            total: members.len() as u64,
        })
    }

    async fn move_batch(
        &self,
        source: CollectionId,
        destination: CollectionId,
        company_ids: &[CompanyId],
    ) -> TransportResult<usize> {
        let op = RemoteCall::MoveBatch;
        self.begin(
            op,
            MockCall::MoveBatch {
                source,
                destination,
                company_ids: company_ids.to_vec(),
            },
        )
        .await?;
        self.lock().transfer(op, source, destination, Some(company_ids))
    }

    async fn move_all_members(
        &self,
        source: CollectionId,
        destination: CollectionId,
    ) -> TransportResult<usize> {
        let op = RemoteCall::MoveAll;
        self.begin(op, MockCall::MoveAll { source, destination }).await?;
        self.lock().transfer(op, source, destination, None)
    }
}
