//! The emission-factor reference dataset.
//!
//! A small, slowly-changing dataset, so fetches go through the response cache by
//! default ([`CacheMode::Use`]); a live fetch always overwrites the cached copy.

use serde::Deserialize;
use url::Url;

use crate::core::client::{CacheMode, RetryConfig};
use crate::core::net;
use crate::core::{CcClient, CcError, EmissionFactor, FactorCategory};

/* ---------------- Public API ---------------- */

/// Fetch the full emission-factor dataset with default options.
pub async fn factors(client: &CcClient) -> Result<Vec<EmissionFactor>, CcError> {
    FactorsBuilder::new(client).fetch().await
}

/// Builder for emission-factor queries.
pub struct FactorsBuilder {
    client: CcClient,
    region: Option<String>,
    category: Option<FactorCategory>,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
}

impl FactorsBuilder {
    #[must_use]
    pub fn new(client: &CcClient) -> Self {
        Self {
            client: client.clone(),
            region: None,
            category: None,
            cache_mode: CacheMode::Use,
            retry_override: None,
        }
    }

    /// Restrict to factors for one region code (e.g. `AU`).
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Restrict to one factor category.
    #[must_use]
    pub fn category(mut self, category: FactorCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Execute the query.
    pub async fn fetch(self) -> Result<Vec<EmissionFactor>, CcError> {
        let mut url = self.client.base_api().join("factors")?;
        if self.region.is_some() || self.category.is_some() {
            let mut qp = url.query_pairs_mut();
            if let Some(region) = &self.region {
                qp.append_pair("region", region);
            }
            if let Some(category) = self.category {
                qp.append_pair("category", category.as_str());
            }
        }

        if self.cache_mode == CacheMode::Use
            && let Some(body) = self.client.cache_get(&url)
        {
            return parse_factors(&body);
        }

        let body = fetch_factors_raw(&self.client, &url, self.retry_override.as_ref()).await?;
        if self.cache_mode != CacheMode::Bypass {
            self.client.cache_put(&url, &body, None);
        }
        parse_factors(&body)
    }
}

/* ---------------- Internal ---------------- */

async fn fetch_factors_raw(
    client: &CcClient,
    url: &Url,
    retry_override: Option<&RetryConfig>,
) -> Result<String, CcError> {
    let req = client
        .http()
        .get(url.clone())
        .header("accept", "application/json");
    let resp = client.send_authed(req, retry_override).await?;
    net::check_status(&resp)?;
    Ok(resp.text().await?)
}

fn parse_factors(body: &str) -> Result<Vec<EmissionFactor>, CcError> {
    let env: FactorsEnvelope = net::from_json(body, "factors")?;
    env.data
        .unwrap_or_default()
        .into_iter()
        .map(map_node)
        .collect()
}

fn map_node(node: FactorNode) -> Result<EmissionFactor, CcError> {
    let category = FactorCategory::parse(&node.category)
        .ok_or_else(|| CcError::Data(format!("unknown factor category: {}", node.category)))?;
    Ok(EmissionFactor {
        id: node.id,
        name: node.name,
        category,
        unit: node.unit,
        kg_co2e_per_unit: node.kg_co2e_per_unit,
        region: node.region,
        source: node.source,
    })
}

/* ---------------- Minimal serde for the factors endpoint ---------------- */

#[derive(Deserialize)]
struct FactorsEnvelope {
    data: Option<Vec<FactorNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FactorNode {
    id: String,
    name: String,
    category: String,
    unit: String,
    kg_co2e_per_unit: f64,
    region: Option<String>,
    source: Option<String>,
}
