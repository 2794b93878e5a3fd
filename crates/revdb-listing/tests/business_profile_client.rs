//! Integration tests for `BusinessProfileClient` and the paged review fetch.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use revdb_listing::{
    fetch_reviews_since, BusinessProfileClient, ListingApi, ListingError, Location,
};

fn test_client(server: &MockServer) -> BusinessProfileClient {
    BusinessProfileClient::with_base_urls(&server.uri(), Some("test-token"), 5)
        .expect("failed to build test client")
}

fn location() -> Location {
    Location {
        path: "accounts/1/locations/2".to_string(),
        name: "Depot".to_string(),
        postal_code: "AB1 2CD".to_string(),
        client_id: Some(7),
        time_zone: None,
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_accounts_returns_names_and_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [
                {"name": "accounts/1", "accountName": "Main"},
                {"name": "accounts/2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = test_client(&server).list_accounts().await.unwrap();
    assert_eq!(accounts, vec!["accounts/1", "accounts/2"]);
}

#[tokio::test]
async fn list_accounts_accepts_single_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"accounts": {"name": "accounts/9"}})),
        )
        .mount(&server)
        .await;

    let accounts = test_client(&server).list_accounts().await.unwrap();
    assert_eq!(accounts, vec!["accounts/9"]);
}

#[tokio::test]
async fn non_success_status_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = test_client(&server).list_accounts().await;
    assert!(
        matches!(result, Err(ListingError::UnexpectedStatus { status: 403, .. })),
        "expected UnexpectedStatus(403), got: {result:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server).list_accounts().await;
    assert!(matches!(result, Err(ListingError::Deserialize { .. })));
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_locations_follows_page_tokens_and_drops_missing_postcodes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/1/locations"))
        .and(query_param("readMask", "name,title,storefrontAddress"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [
                {
                    "name": "locations/10",
                    "title": "High Street",
                    "storefrontAddress": {"postalCode": "AB1 2CD"}
                },
                {"name": "locations/11", "title": "No Address"}
            ],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts/1/locations"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [{
                "name": "locations/12",
                "storefrontAddress": {"postalCode": "EF3 4GH"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let locations = test_client(&server)
        .list_locations("accounts/1")
        .await
        .unwrap();

    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].path, "accounts/1/locations/10");
    assert_eq!(locations[0].name, "High Street");
    assert_eq!(locations[1].name, "Location 12");
    assert_eq!(locations[1].postal_code, "EF3 4GH");
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn review_fetch_stops_requesting_pages_after_cutoff() {
    let server = MockServer::start().await;
    let reviews_path = "/accounts/1/locations/2/reviews";

    Mock::given(method("GET"))
        .and(path(reviews_path))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [
                {
                    "name": "r1",
                    "starRating": "FIVE",
                    "comment": "Spotless car",
                    "createTime": "2024-03-20T09:00:00Z"
                },
                {
                    "name": "r2",
                    "starRating": {"count": 2},
                    "createTime": "2024-03-05T09:00:00Z"
                }
            ],
            "nextPageToken": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(reviews_path))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [
                {
                    "name": "r3",
                    "starRating": "THREE",
                    "createTime": "2024-02-25T09:00:00Z"
                }
            ],
            "nextPageToken": "p3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(reviews_path))
        .and(query_param("pageToken", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reviews": []})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cutoff = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let reviews = fetch_reviews_since(&client, &location(), cutoff)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].rating, 5);
    assert_eq!(reviews[0].text, "Spotless car");
    assert_eq!(reviews[1].rating, 2);
    assert!(reviews[1].text.is_empty());
}

#[tokio::test]
async fn review_page_error_aborts_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/1/locations/2/reviews"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cutoff = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let result = fetch_reviews_since(&client, &location(), cutoff).await;
    assert!(matches!(
        result,
        Err(ListingError::UnexpectedStatus { status: 500, .. })
    ));
}
