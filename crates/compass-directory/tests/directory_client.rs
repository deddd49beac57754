//! Integration tests for `DirectoryClient` using wiremock HTTP mocks.

use compass_directory::{Directory, DirectoryClient, DirectoryError, DirectoryQuery};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(search_base: &str, geocoder_base: &str) -> DirectoryClient {
    DirectoryClient::with_base_urls("test-key", 5, "compass-test/0.1", search_base, geocoder_base)
        .expect("client construction should not fail")
}

fn query(max_results: u32) -> DirectoryQuery {
    DirectoryQuery {
        query: "dentists".to_string(),
        location: "Austin, TX".to_string(),
        radius_m: 15_000,
        max_results,
    }
}

fn place(id: &str, name: &str, website: Option<&str>) -> serde_json::Value {
    json!({
        "place_id": id,
        "name": name,
        "full_address": "Austin, TX",
        "latitude": 30.27,
        "longitude": -97.74,
        "categories": "Dentist",
        "average_rating": 4.5,
        "review_count": 40,
        "website": website,
    })
}

async fn mount_geocoder(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .and(query_param("q", "Austin, TX"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"lat": "30.2672", "lon": "-97.7431"}])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_geocodes_then_posts_viewport() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_geocoder(&geocoder).await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "q": "dentists",
            "ll": "@30.2672,-97.7431,11z",
            "page": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                place("a", "Alpha Dental", Some("https://alpha.example")),
                place("b", "Bravo Dental", Some("N/A")),
            ]
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let candidates = client.search(&query(10)).await.expect("search succeeds");

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].id, "gmaps:a");
    assert_eq!(candidates[0].name, "Alpha Dental");
    assert_eq!(
        candidates[0].website.as_deref(),
        Some("https://alpha.example")
    );
    assert!(candidates[1].website.is_none());
}

#[tokio::test]
async fn search_truncates_to_max_results_in_provider_order() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_geocoder(&geocoder).await;

    let data: Vec<_> = (0..8)
        .map(|i| place(&format!("p{i}"), &format!("Clinic {i}"), None))
        .collect();
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let candidates = client.search(&query(3)).await.expect("search succeeds");

    let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["gmaps:p0", "gmaps:p1", "gmaps:p2"]);
}

#[tokio::test]
async fn geocoder_failure_falls_back_to_name_only_search() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&geocoder)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"q": "dentists in Austin, TX"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [place("a", "Alpha Dental", None)]})),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let candidates = client.search(&query(10)).await.expect("search succeeds");
    assert_eq!(candidates.len(), 1);
}

#[tokio::test]
async fn empty_geocoder_result_omits_viewport() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&geocoder)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"q": "dentists in Austin, TX"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let candidates = client.search(&query(10)).await.expect("search succeeds");
    assert!(candidates.is_empty(), "missing data key means no results");
}

#[tokio::test]
async fn provider_error_status_is_reported() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_geocoder(&geocoder).await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let err = client.search(&query(10)).await.unwrap_err();
    assert!(
        matches!(err, DirectoryError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_provider_body_is_a_deserialize_error() {
    let geocoder = MockServer::start().await;
    let provider = MockServer::start().await;
    mount_geocoder(&geocoder).await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&provider)
        .await;

    let client = test_client(&provider.uri(), &geocoder.uri());
    let err = client.search(&query(10)).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Deserialize { .. }), "got: {err:?}");
}
