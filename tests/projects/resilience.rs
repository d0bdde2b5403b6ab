use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use url::Url;

use carbonconstruct_rs::projects::ProjectsBuilder;
use carbonconstruct_rs::{Backoff, CcClient, CcError, RetryConfig};

use crate::common::client_for;

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        backoff: Backoff::Exponential {
            base: Duration::from_millis(5),
            factor: 2.0,
            max: Duration::from_millis(50),
            jitter: false,
        },
        ..RetryConfig::default()
    }
}

#[tokio::test]
async fn transient_statuses_burn_the_retry_budget() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/projects");
        then.status(503).body("upstream unavailable");
    });

    let client = client_for(&server);
    let err = ProjectsBuilder::new(&client)
        .retry_policy(Some(fast_retry(2)))
        .list()
        .await
        .unwrap_err();

    match err {
        CcError::Status { status, .. } => assert_eq!(status, 503),
        other => panic!("expected Status error, got {other:?}"),
    }
    // Initial attempt plus two retries.
    assert_eq!(mock.hits(), 3);
}

#[tokio::test]
async fn validation_failures_are_never_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/projects");
        then.status(422).body(r#"{"error": "bad filter"}"#);
    });

    let client = client_for(&server);
    let err = ProjectsBuilder::new(&client)
        .retry_policy(Some(fast_retry(4)))
        .list()
        .await
        .unwrap_err();

    match err {
        CcError::Status { status, .. } => assert_eq!(status, 422),
        other => panic!("expected Status error, got {other:?}"),
    }
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn api_key_is_exchanged_once_and_reused() {
    let server = MockServer::start();

    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/auth/token")
            .json_body(serde_json::json!({"apiKey": "cc_test_key"}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"accessToken": "tok-1"}"#);
    });

    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/projects")
            .header("authorization", "Bearer tok-1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data": []}"#);
    });

    let client = CcClient::builder()
        .base_api(Url::parse(&format!("{}/v1/", server.base_url())).unwrap())
        .token_url(Url::parse(&format!("{}/v1/auth/token", server.base_url())).unwrap())
        .probe_url(Url::parse(&format!("{}/v1/health", server.base_url())).unwrap())
        .api_key("cc_test_key")
        .build()
        .unwrap();

    ProjectsBuilder::new(&client).list().await.unwrap();
    ProjectsBuilder::new(&client).list().await.unwrap();

    // The exchange happens on first use only; the cached token covers both calls.
    token.assert();
    assert_eq!(list.hits(), 2);
}

#[tokio::test]
async fn list_responses_are_cached_until_a_mutation() {
    let server = MockServer::start();

    let list = server.mock(|when, then| {
        when.method(GET).path("/v1/projects");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data": []}"#);
    });
    let _create = server.mock(|when, then| {
        when.method(POST).path("/v1/projects");
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"data": {
                "id": "p-1",
                "name": "Depot",
                "description": null,
                "status": "draft",
                "region": null,
                "totalKgCo2e": null,
                "createdAt": "2026-03-01T00:00:00Z",
                "updatedAt": "2026-03-01T00:00:00Z"
            }}"#);
    });

    let client = CcClient::builder()
        .base_api(Url::parse(&format!("{}/v1/", server.base_url())).unwrap())
        .token_url(Url::parse(&format!("{}/v1/auth/token", server.base_url())).unwrap())
        .probe_url(Url::parse(&format!("{}/v1/health", server.base_url())).unwrap())
        .cache_ttl(Duration::from_secs(300))
        .build()
        .unwrap();

    ProjectsBuilder::new(&client).list().await.unwrap();
    ProjectsBuilder::new(&client).list().await.unwrap();
    assert_eq!(list.hits(), 1, "second list should come from the cache");

    ProjectsBuilder::new(&client)
        .create(carbonconstruct_rs::NewProject::new("Depot"))
        .await
        .unwrap();

    ProjectsBuilder::new(&client).list().await.unwrap();
    assert_eq!(list.hits(), 2, "mutation should invalidate the cached list");
}
