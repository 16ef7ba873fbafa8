//! HTTP contract tests for `HttpCollectionClient` against a mock store.

use jam_client::{ClientConfig, HttpCollectionClient};
use jam_core::{CollectionId, RemoteCall, RemoteCollectionClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpCollectionClient {
    HttpCollectionClient::new(ClientConfig::new(server.uri())).expect("Failed to create client")
}

#[tokio::test]
async fn test_list_collections() {
    let mock_server = MockServer::start().await;
    let my_list = CollectionId::new_v4();
    let ignored = CollectionId::new_v4();

    Mock::given(method("GET"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": my_list.to_string(), "collection_name": "My List"},
            {"id": ignored.to_string(), "collection_name": "Companies to Ignore List"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let collections = client_for(&mock_server).list_collections().await.unwrap();

    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].id, my_list);
    assert_eq!(collections[0].collection_name, "My List");
    assert_eq!(collections[1].id, ignored);
}

#[tokio::test]
async fn test_list_members_sends_offset_and_limit() {
    let mock_server = MockServer::start().await;
    let collection = CollectionId::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/collections/{}", collection)))
        .and(query_param("offset", "50"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": collection.to_string(),
            "collection_name": "My List",
            "companies": [
                {"id": 51, "company_name": "Acme", "liked": false},
                {"id": 52, "company_name": "Globex", "liked": true}
            ],
            "total": 120
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = client_for(&mock_server)
        .list_members(collection, 50, 25)
        .await
        .unwrap();

    assert_eq!(page.total, 120);
    assert_eq!(page.companies.len(), 2);
    assert_eq!(page.companies[0].company_name, "Acme");
    assert!(page.companies[1].liked);
}

#[tokio::test]
async fn test_move_batch_posts_destination_and_ids() {
    let mock_server = MockServer::start().await;
    let source = CollectionId::new_v4();
    let destination = CollectionId::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/collections/{}/move", source)))
        .and(body_json(json!({
            "destination_id": destination.to_string(),
            "company_ids": [3, 1, 2]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Moved 3 companies successfully."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let moved = client_for(&mock_server)
        .move_batch(source, destination, &[3, 1, 2])
        .await
        .unwrap();

    assert_eq!(moved, 3);
}

#[tokio::test]
async fn test_move_batch_reports_server_count() {
    let mock_server = MockServer::start().await;
    let source = CollectionId::new_v4();
    let destination = CollectionId::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/collections/{}/move", source)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Moved 1 companies successfully."})),
        )
        .mount(&mock_server)
        .await;

    let moved = client_for(&mock_server)
        .move_batch(source, destination, &[1, 2])
        .await
        .unwrap();

    assert_eq!(moved, 1);
}

#[tokio::test]
async fn test_move_all_passes_destination_as_query() {
    let mock_server = MockServer::start().await;
    let source = CollectionId::new_v4();
    let destination = CollectionId::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/collections/{}/move_all", source)))
        .and(query_param("destination_id", destination.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Moved 250 companies successfully."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let moved = client_for(&mock_server)
        .move_all_members(source, destination)
        .await
        .unwrap();

    assert_eq!(moved, 250);
}

#[tokio::test]
async fn test_error_status_maps_to_transport_error() {
    let mock_server = MockServer::start().await;
    let source = CollectionId::new_v4();
    let destination = CollectionId::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/collections/{}/move", source)))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"detail": "Failed to move companies: boom"})),
        )
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .move_batch(source, destination, &[1])
        .await
        .unwrap_err();

    assert_eq!(err.call, RemoteCall::MoveBatch);
    assert_eq!(err.status, Some(500));
    assert_eq!(err.batch_index, None);
    assert!(err.message.contains("boom"));
}

#[tokio::test]
async fn test_not_found_maps_to_transport_error() {
    let mock_server = MockServer::start().await;
    let collection = CollectionId::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/collections/{}", collection)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .list_members(collection, 0, 25)
        .await
        .unwrap_err();

    assert_eq!(err.call, RemoteCall::ListMembers);
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn test_undecodable_body_maps_to_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .list_collections()
        .await
        .unwrap_err();

    assert_eq!(err.call, RemoteCall::ListCollections);
    assert_eq!(err.status, None);
    assert!(err.message.contains("decode"));
}

#[tokio::test]
async fn test_unreachable_store_maps_to_transport_error() {
    // Port 9 (discard) is not expected to serve HTTP.
    let client = HttpCollectionClient::new(
        ClientConfig::new("http://127.0.0.1:9").with_timeout_secs(2),
    )
    .unwrap();

    let err = client.list_collections().await.unwrap_err();

    assert_eq!(err.call, RemoteCall::ListCollections);
    assert_eq!(err.status, None);
}
