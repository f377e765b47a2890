//! Tests de middleware.

mod helpers;

use helpers::client;
use uuid::Uuid;

// === Request ID ===

#[tokio::test]
async fn response_includes_request_id() {
    let response = client().get("/health").await;

    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn request_id_is_valid_uuid() {
    let response = client().get("/health").await;

    let id = response.header("x-request-id").unwrap();
    let parsed = Uuid::parse_str(id);

    assert!(parsed.is_ok(), "Invalid UUID: {}", id);
}

#[tokio::test]
async fn request_id_is_uuid_v4() {
    let response = client().get("/health").await;

    let id = response.header("x-request-id").unwrap();
    let parsed = Uuid::parse_str(id).unwrap();

    assert_eq!(parsed.get_version_num(), 4);
}

#[tokio::test]
async fn propagates_incoming_request_id() {
    let custom_id = "my-custom-request-id-12345";

    let response = client()
        .get_with_headers("/health", vec![("x-request-id", custom_id)])
        .await;

    response.assert_header("x-request-id", custom_id);
}

#[tokio::test]
async fn generates_different_ids_for_each_request() {
    let response1 = client().get("/health").await;
    let response2 = client().get("/health").await;

    let id1 = response1.header("x-request-id").unwrap();
    let id2 = response2.header("x-request-id").unwrap();

    assert_ne!(id1, id2);
}

#[tokio::test]
async fn replaces_oversized_request_id() {
    let oversized = "x".repeat(500);

    let response = client()
        .get_with_headers("/health", vec![("x-request-id", oversized.as_str())])
        .await;

    let id = response.header("x-request-id").unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn replaces_request_id_with_spaces() {
    let response = client()
        .get_with_headers("/health", vec![("x-request-id", "not a valid id")])
        .await;

    let id = response.header("x-request-id").unwrap();
    assert_ne!(id, "not a valid id");
}

// === Request ID Propagation in Different Endpoints ===

#[tokio::test]
async fn request_id_present_in_stats_endpoint() {
    let response = client().get("/cache/stats").await;

    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn request_id_present_on_not_found() {
    let response = client().get("/does/not/exist").await;

    response.assert_header_exists("x-request-id");
}

// === Cache status ===

#[tokio::test]
async fn admin_endpoints_carry_no_cache_status() {
    let response = client().get("/health").await;

    assert_eq!(response.cache_status(), None);
}
