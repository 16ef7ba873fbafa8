//! Core traits for jam abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::models::{CollectionId, CollectionMetadata, CompanyId, MemberPage};

/// Remote store holding collections and their members.
///
/// Every failure surfaces as a single `TransportError` naming the call.
#[async_trait]
pub trait RemoteCollectionClient: Send + Sync {
    /// List all collections in store order.
    async fn list_collections(&self) -> TransportResult<Vec<CollectionMetadata>>;

    /// Fetch one page of a collection's members plus the total count.
    async fn list_members(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> TransportResult<MemberPage>;

    /// Move the given members from `source` to `destination`.
    ///
    /// All-or-nothing per call. Returns the count the store reports moved.
    async fn move_batch(
        &self,
        source: CollectionId,
        destination: CollectionId,
        company_ids: &[CompanyId],
    ) -> TransportResult<usize>;

    /// Move every member of `source` to `destination` in one call.
    async fn move_all_members(
        &self,
        source: CollectionId,
        destination: CollectionId,
    ) -> TransportResult<usize>;
}

#[async_trait]
impl<T: RemoteCollectionClient + ?Sized> RemoteCollectionClient for Arc<T> {
    async fn list_collections(&self) -> TransportResult<Vec<CollectionMetadata>> {
        (**self).list_collections().await
    }

    async fn list_members(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> TransportResult<MemberPage> {
        (**self).list_members(collection_id, offset, limit).await
    }

    async fn move_batch(
        &self,
        source: CollectionId,
        destination: CollectionId,
        company_ids: &[CompanyId],
    ) -> TransportResult<usize> {
        (**self).move_batch(source, destination, company_ids).await
    }

    async fn move_all_members(
        &self,
        source: CollectionId,
        destination: CollectionId,
    ) -> TransportResult<usize> {
        (**self).move_all_members(source, destination).await
    }
}
