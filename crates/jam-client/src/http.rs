//! HTTP implementation of the remote collection store client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use jam_core::{
    CollectionId, CollectionMetadata, Company, CompanyId, MemberPage, RemoteCall,
    RemoteCollectionClient, TransportError, TransportResult,
};

use crate::config::{ClientConfig, ConfigError, ConfigResult};

/// Client for the collection store's HTTP API.
#[derive(Clone)]
pub struct HttpCollectionClient {
    client: Client,
    base_url: String,
}

impl HttpCollectionClient {
    /// Create a client from validated configuration.
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "HTTP collection client ready"
        );

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// `GET /collections/{id}` response body.
#[derive(Deserialize)]
struct CollectionPageResponse {
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    total: u64,
}

/// `POST /collections/{id}/move` request body.
#[derive(Serialize)]
struct MoveCompaniesRequest<'a> {
    destination_id: CollectionId,
    company_ids: &'a [CompanyId],
}

/// Response of both move endpoints.
#[derive(Deserialize, Default)]
struct MoveResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    moved_count: Option<usize>,
}

impl MoveResponse {
    /// Count the store claims it moved: an explicit `moved_count`, else the
    /// number in "Moved N companies successfully.".
    fn reported_count(&self) -> Option<usize> {
        self.moved_count
            .or_else(|| self.message.as_deref().and_then(parse_moved_message))
    }
}

fn parse_moved_message(message: &str) -> Option<usize> {
    let mut words = message.split_whitespace();
    if words.next()? != "Moved" {
        return None;
    }
    words.next()?.parse().ok()
}

fn request_error(call: RemoteCall, e: reqwest::Error) -> TransportError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    let err = TransportError::new(call, message);
    match e.status() {
        Some(status) => err.with_status(status.as_u16()),
        None => err,
    }
}

/// Map a non-success status to a transport error carrying the response body.
async fn ensure_success(call: RemoteCall, response: Response) -> TransportResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(op = %call, status = status.as_u16(), "Store returned error status");
    Err(TransportError::new(call, format!("store returned {}: {}", status, body))
        .with_status(status.as_u16()))
}

async fn decode<T: for<'de> Deserialize<'de>>(
    call: RemoteCall,
    response: Response,
) -> TransportResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::new(call, format!("failed to decode response: {}", e)))
}

#[async_trait]
impl RemoteCollectionClient for HttpCollectionClient {
    #[instrument(skip_all)]
    async fn list_collections(&self) -> TransportResult<Vec<CollectionMetadata>> {
        let call = RemoteCall::ListCollections;
        let response = self
            .client
            .get(self.url("/collections"))
            .send()
            .await
            .map_err(|e| request_error(call, e))?;

        let collections: Vec<CollectionMetadata> =
            decode(call, ensure_success(call, response).await?).await?;
        debug!(count = collections.len(), "Listed collections");
        Ok(collections)
    }

    #[instrument(skip_all, fields(collection_id = %collection_id, offset = offset, limit = limit))]
    async fn list_members(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> TransportResult<MemberPage> {
        let call = RemoteCall::ListMembers;
        let start = Instant::now();

        let response = self
            .client
            .get(self.url(&format!("/collections/{}", collection_id)))
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await
            .map_err(|e| request_error(call, e))?;

        let page: CollectionPageResponse =
            decode(call, ensure_success(call, response).await?).await?;

        debug!(
            returned = page.companies.len(),
            total = page.total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched collection page"
        );

        Ok(MemberPage {
            companies: page.companies,
            total: page.total,
        })
    }

    #[instrument(
        skip_all,
        fields(source_id = %source, destination_id = %destination, count = company_ids.len())
    )]
    async fn move_batch(
        &self,
        source: CollectionId,
        destination: CollectionId,
        company_ids: &[CompanyId],
    ) -> TransportResult<usize> {
        let call = RemoteCall::MoveBatch;
        let body = MoveCompaniesRequest {
            destination_id: destination,
            company_ids,
        };

        let response = self
            .client
            .post(self.url(&format!("/collections/{}/move", source)))
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(call, e))?;

        let moved: MoveResponse = decode(call, ensure_success(call, response).await?).await?;
        let reported = moved.reported_count().unwrap_or(company_ids.len());
        debug!(moved_count = reported, "Moved batch");
        Ok(reported)
    }

    #[instrument(skip_all, fields(source_id = %source, destination_id = %destination))]
    async fn move_all_members(
        &self,
        source: CollectionId,
        destination: CollectionId,
    ) -> TransportResult<usize> {
        let call = RemoteCall::MoveAll;
        let response = self
            .client
            .post(self.url(&format!("/collections/{}/move_all", source)))
            .query(&[("destination_id", destination.to_string())])
            .send()
            .await
            .map_err(|e| request_error(call, e))?;

        let moved: MoveResponse = decode(call, ensure_success(call, response).await?).await?;
        let reported = moved.reported_count().unwrap_or_default();
        debug!(moved_count = reported, "Moved all members");
        Ok(reported)
    }
}
