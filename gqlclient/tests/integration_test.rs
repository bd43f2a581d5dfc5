//! Integration tests for gqlclient over the default reqwest transport.

use gqlclient::*;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COUNTRY_QUERY: &str = "query Country($code: ID!) { country(code: $code) { code name capital } }";

#[derive(Debug, Deserialize, PartialEq)]
struct Country {
    code: String,
    name: String,
    capital: String,
}

#[derive(Debug, Deserialize)]
struct CountryResponse {
    country: Country,
}

fn country_body() -> serde_json::Value {
    json!({
        "data": {
            "country": {"code": "AL", "name": "Albania", "capital": "Tirana"}
        }
    })
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/graphql", server.uri())
}

#[tokio::test]
async fn test_query_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({
            "query": COUNTRY_QUERY,
            "variables": {"code": "AL"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(country_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let response: CountryResponse = client
        .query(COUNTRY_QUERY)
        .variable("code", "AL")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.country,
        Country {
            code: "AL".to_string(),
            name: "Albania".to_string(),
            capital: "Tirana".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unauthorized_refreshes_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(country_body()))
        .expect(1)
        .mount(&server)
        .await;

    let issued = Arc::new(AtomicUsize::new(0));
    let counter = issued.clone();
    let client = GraphQLClient::new(endpoint(&server))
        .unwrap()
        .token_provider(token_fn(move || {
            let counter = counter.clone();
            async move { Ok(format!("token-{}", counter.fetch_add(1, Ordering::SeqCst) + 1)) }
        }));

    let response: CountryResponse = client
        .execute_query(COUNTRY_QUERY, &json!({"code": "AL"}))
        .await
        .unwrap();

    assert_eq!(response.country.name, "Albania");
    assert_eq!(issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_always_unauthorized_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server))
        .unwrap()
        .token_provider(token_fn(|| async { Err::<String, BoxError>("error".into()) }));

    let err = client
        .execute_query::<_, CountryResponse>(COUNTRY_QUERY, &json!({"code": "AL"}))
        .await
        .unwrap_err();

    assert!(err.is_retry_exhausted());
    assert_eq!(err.to_string(), "failed to retry, max retry count reached");
    assert_eq!(err.token_error().unwrap().to_string(), "error");
}

#[tokio::test]
async fn test_server_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let err = client
        .mutation("mutation { reset }")
        .send::<serde_json::Value>()
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_graphql_error_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{
                "message": "Variable \"$code\" of required type \"ID!\" was not provided.",
                "locations": [{"line": 1, "column": 15}],
                "extensions": {"code": "BAD_USER_INPUT"}
            }]
        })))
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let err = client
        .query(COUNTRY_QUERY)
        .send::<CountryResponse>()
        .await
        .unwrap_err();

    let first = err.first_graphql_error().unwrap();
    assert_eq!(
        first.message,
        "Variable \"$code\" of required type \"ID!\" was not provided."
    );
    assert_eq!(first.locations, vec![ErrorLocation { line: 1, column: 15 }]);
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(country_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let err = client
        .query(COUNTRY_QUERY)
        .variable("code", "AL")
        .timeout(Duration::from_millis(200))
        .send::<CountryResponse>()
        .await
        .unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_per_call_timeout_outlasts_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(country_body())
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = GraphQLClientConfig::builder()
        .endpoint(endpoint(&server))
        .timeout(Duration::from_secs(1))
        .build();
    let client = GraphQLClient::with_config(config).unwrap();

    let response: CountryResponse = client
        .query(COUNTRY_QUERY)
        .variable("code", "AL")
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();

    assert_eq!(response.country.capital, "Tirana");
}

#[tokio::test]
async fn test_configured_timeout_reports_its_duration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(country_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = GraphQLClientConfig::builder()
        .endpoint(endpoint(&server))
        .timeout(Duration::from_millis(300))
        .build();
    let client = GraphQLClient::with_config(config).unwrap();

    let err = client
        .query(COUNTRY_QUERY)
        .send::<CountryResponse>()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GraphQLError::Transport(TransportError::Timeout(d)) if d == Duration::from_millis(300)
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = GraphQLClient::new("http://127.0.0.1:1/graphql").unwrap();
    let err = client
        .query(COUNTRY_QUERY)
        .send::<CountryResponse>()
        .await
        .unwrap_err();

    assert!(err.is_network_error());
}
