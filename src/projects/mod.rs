//! Project CRUD over the REST API.
//!
//! Reads (`list`, `get`) honor the response cache; mutations always hit the
//! network and invalidate cached project reads so a stale list never outlives a
//! write. Validation and permission failures (4xx) are surfaced immediately and
//! never retried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::client::{CacheMode, RetryConfig};
use crate::core::net;
use crate::core::{CcClient, CcError, Project, ProjectStatus};

/* ---------------- Public API ---------------- */

/// Fields for creating a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            region: None,
        }
    }
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_status")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_kg_co2e: Option<f64>,
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::ref_option)]
fn ser_status<S: serde::Serializer>(status: &Option<ProjectStatus>, s: S) -> Result<S::Ok, S::Error> {
    match status {
        Some(st) => s.serialize_str(st.as_str()),
        None => s.serialize_none(),
    }
}

/// Builder for project operations.
pub struct ProjectsBuilder {
    client: CcClient,
    status: Option<ProjectStatus>,
    search: Option<String>,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
}

impl ProjectsBuilder {
    #[must_use]
    pub fn new(client: &CcClient) -> Self {
        Self {
            client: client.clone(),
            status: None,
            search: None,
            cache_mode: CacheMode::Use,
            retry_override: None,
        }
    }

    /// Filter `list` by lifecycle status.
    #[must_use]
    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter `list` by a free-text search over name and description.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Cache behavior for `list` and `get` (mutations always bypass).
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

    /// List projects matching the configured filters.
    pub async fn list(self) -> Result<Vec<Project>, CcError> {
        let mut url = self.collection_url()?;
        if self.status.is_some() || self.search.is_some() {
            let mut qp = url.query_pairs_mut();
            if let Some(status) = self.status {
                qp.append_pair("status", status.as_str());
            }
            if let Some(search) = &self.search {
                qp.append_pair("search", search);
            }
        }

        if self.cache_mode == CacheMode::Use
            && let Some(body) = self.client.cache_get(&url)
        {
            return parse_list(&body);
        }

        let body = self.fetch_raw(&url).await?;
        if self.cache_mode != CacheMode::Bypass {
            self.client.cache_put(&url, &body, None);
        }
        parse_list(&body)
    }

    /// Fetch a single project by id.
    pub async fn get(self, id: &str) -> Result<Project, CcError> {
        let url = self.item_url(id)?;

        if self.cache_mode == CacheMode::Use
            && let Some(body) = self.client.cache_get(&url)
        {
            return parse_single(&body);
        }

        let body = self.fetch_raw(&url).await?;
        if self.cache_mode != CacheMode::Bypass {
            self.client.cache_put(&url, &body, None);
        }
        parse_single(&body)
    }

    /// Create a project.
    pub async fn create(self, new_project: NewProject) -> Result<Project, CcError> {
        let url = self.collection_url()?;
        let req = self.client.http().post(url.clone()).json(&new_project);
        let resp = self.client.send_authed(req, self.retry_override.as_ref()).await?;
        net::check_status(&resp)?;
        let body = resp.text().await?;
        self.invalidate_cached_reads();
        parse_single(&body)
    }

    /// Apply a partial update to a project.
    pub async fn update(self, id: &str, patch: ProjectPatch) -> Result<Project, CcError> {
        let url = self.item_url(id)?;
        let req = self.client.http().patch(url.clone()).json(&patch);
        let resp = self.client.send_authed(req, self.retry_override.as_ref()).await?;
        net::check_status(&resp)?;
        let body = resp.text().await?;
        self.invalidate_cached_reads();
        parse_single(&body)
    }

    /// Delete a project.
    pub async fn delete(self, id: &str) -> Result<(), CcError> {
        let url = self.item_url(id)?;
        let req = self.client.http().delete(url.clone());
        let resp = self.client.send_authed(req, self.retry_override.as_ref()).await?;
        net::check_status(&resp)?;
        self.invalidate_cached_reads();
        Ok(())
    }

    /* ---------------- Internal ---------------- */

    fn collection_url(&self) -> Result<Url, CcError> {
        Ok(self.client.base_api().join("projects")?)
    }

    fn item_url(&self, id: &str) -> Result<Url, CcError> {
        Ok(self.client.base_api().join(&format!("projects/{id}"))?)
    }

    async fn fetch_raw(&self, url: &Url) -> Result<String, CcError> {
        let req = self
            .client
            .http()
            .get(url.clone())
            .header("accept", "application/json");
        let resp = self.client.send_authed(req, self.retry_override.as_ref()).await?;
        net::check_status(&resp)?;
        Ok(resp.text().await?)
    }

    fn invalidate_cached_reads(&self) {
        if let Ok(prefix) = self.collection_url() {
            self.client.cache_invalidate(prefix.as_str());
        }
    }
}

/* ---------------- Minimal serde for the projects endpoints ---------------- */

fn parse_list(body: &str) -> Result<Vec<Project>, CcError> {
    let env: ListEnvelope = net::from_json(body, "projects list")?;
    env.data
        .unwrap_or_default()
        .into_iter()
        .map(map_node)
        .collect()
}

fn parse_single(body: &str) -> Result<Project, CcError> {
    let env: SingleEnvelope = net::from_json(body, "project")?;
    let node = env
        .data
        .ok_or_else(|| CcError::Data("project response missing data".into()))?;
    map_node(node)
}

fn map_node(node: ProjectNode) -> Result<Project, CcError> {
    let status = ProjectStatus::parse(&node.status)
        .ok_or_else(|| CcError::Data(format!("unknown project status: {}", node.status)))?;
    Ok(Project {
        id: node.id,
        name: node.name,
        description: node.description,
        status,
        region: node.region,
        total_kg_co2e: node.total_kg_co2e,
        created_at: node.created_at,
        updated_at: node.updated_at,
    })
}

#[derive(Deserialize)]
struct ListEnvelope {
    data: Option<Vec<ProjectNode>>,
}

#[derive(Deserialize)]
struct SingleEnvelope {
    data: Option<ProjectNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectNode {
    id: String,
    name: String,
    description: Option<String>,
    status: String,
    region: Option<String>,
    total_kg_co2e: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
