use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use url::Url;

use carbonconstruct_rs::factors::FactorsBuilder;
use carbonconstruct_rs::{CacheMode, CcClient, FactorCategory};

use crate::common::client_for;

const FACTORS_BODY: &str = r#"{
  "data": [
    {
      "id": "f-concrete-32",
      "name": "Concrete 32 MPa",
      "category": "material",
      "unit": "kg",
      "kgCo2ePerUnit": 0.171,
      "region": "AU",
      "source": "EPiC"
    },
    {
      "id": "f-truck-artic",
      "name": "Articulated truck freight",
      "category": "transport",
      "unit": "t.km",
      "kgCo2ePerUnit": 0.085,
      "region": null,
      "source": null
    }
  ]
}"#;

fn caching_client(server: &MockServer) -> CcClient {
    CcClient::builder()
        .base_api(Url::parse(&format!("{}/v1/", server.base_url())).unwrap())
        .token_url(Url::parse(&format!("{}/v1/auth/token", server.base_url())).unwrap())
        .probe_url(Url::parse(&format!("{}/v1/health", server.base_url())).unwrap())
        .cache_ttl(Duration::from_secs(300))
        .build()
        .unwrap()
}

#[tokio::test]
async fn fetch_maps_the_dataset() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/factors");
        then.status(200)
            .header("content-type", "application/json")
            .body(FACTORS_BODY);
    });

    let client = client_for(&server);
    let dataset = FactorsBuilder::new(&client).fetch().await.unwrap();

    mock.assert();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset[0].category, FactorCategory::Material);
    assert_eq!(dataset[0].kg_co2e_per_unit, 0.171);
    assert_eq!(dataset[1].unit, "t.km");
    assert_eq!(dataset[1].source, None);
}

#[tokio::test]
async fn filters_become_query_params() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/factors")
            .query_param("region", "AU")
            .query_param("category", "material");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data": []}"#);
    });

    let client = client_for(&server);
    let dataset = FactorsBuilder::new(&client)
        .region("AU")
        .category(FactorCategory::Material)
        .fetch()
        .await
        .unwrap();

    mock.assert();
    assert!(dataset.is_empty());
}

#[tokio::test]
async fn cache_modes_control_the_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/factors");
        then.status(200)
            .header("content-type", "application/json")
            .body(FACTORS_BODY);
    });

    let client = caching_client(&server);

    // Use: first fetch populates, second is served from the cache.
    FactorsBuilder::new(&client).fetch().await.unwrap();
    FactorsBuilder::new(&client).fetch().await.unwrap();
    assert_eq!(mock.hits(), 1);

    // Refresh: always hits the network and overwrites the cached copy.
    FactorsBuilder::new(&client)
        .cache_mode(CacheMode::Refresh)
        .fetch()
        .await
        .unwrap();
    assert_eq!(mock.hits(), 2);

    // The refreshed copy serves later reads.
    FactorsBuilder::new(&client).fetch().await.unwrap();
    assert_eq!(mock.hits(), 2);

    // Bypass: network, but no cache interaction either way.
    FactorsBuilder::new(&client)
        .cache_mode(CacheMode::Bypass)
        .fetch()
        .await
        .unwrap();
    assert_eq!(mock.hits(), 3);
}

#[tokio::test]
async fn unknown_category_is_a_data_error() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/v1/factors");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data": [{
                "id": "f-x",
                "name": "Mystery",
                "category": "vibes",
                "unit": "kg",
                "kgCo2ePerUnit": 1.0,
                "region": null,
                "source": null
            }]}"#);
    });

    let client = client_for(&server);
    let err = FactorsBuilder::new(&client).fetch().await.unwrap_err();
    assert!(err.to_string().contains("unknown factor category"));
}
