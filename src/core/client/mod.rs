//! Public client surface + builder.
//! Internals are split into `auth` (API-key/token exchange), `retry` (policy
//! types), and `constants` (UA + defaults).

mod auth;
mod constants;
mod retry;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::connectivity::ConnectivityHandle;
use crate::core::CcError;
use crate::core::cache::{CacheStorage, MemoryStorage, TtlCache};
use constants::{DEFAULT_BASE_API, DEFAULT_PROBE_URL, DEFAULT_TOKEN_URL, USER_AGENT};

pub use retry::{CacheMode, RetryConfig};

#[derive(Debug, Default)]
struct AuthState {
    access_token: Option<String>,
}

/// The CarbonConstruct API client.
///
/// Cheap to clone; all clones share the HTTP connection pool, the auth state,
/// and the response cache.
#[derive(Debug, Clone)]
pub struct CcClient {
    http: Client,
    base_api: Url,
    token_url: Url,
    probe_url: Url,
    api_key: Option<String>,

    state: Arc<RwLock<AuthState>>,
    credential_fetch_lock: Arc<tokio::sync::Mutex<()>>,

    cache: Option<Arc<TtlCache>>,
    retry: RetryConfig,
    connectivity: Option<ConnectivityHandle>,
}

impl Default for CcClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl CcClient {
    /// Create a new builder.
    pub fn builder() -> CcClientBuilder {
        CcClientBuilder::default()
    }

    /* -------- internal getters used by other modules -------- */

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn base_api(&self) -> &Url {
        &self.base_api
    }

    /// The reachability-probe endpoint the connectivity monitor defaults to.
    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    /// The connectivity handle shared with this client, if any.
    pub fn connectivity(&self) -> Option<&ConnectivityHandle> {
        self.connectivity.as_ref()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub(crate) fn cache_get(&self, url: &Url) -> Option<String> {
        self.cache.as_ref()?.get(url.as_str())
    }

    pub(crate) fn cache_put(&self, url: &Url, body: &str, ttl_override: Option<Duration>) {
        if let Some(cache) = &self.cache {
            cache.set(url.as_str(), &body, ttl_override);
        }
    }

    /// Drop cached responses whose key starts with `prefix` (mutations call this
    /// so stale reads don't outlive a write).
    pub(crate) fn cache_invalidate(&self, prefix: &str) {
        if let Some(cache) = &self.cache {
            cache.clear(Some(prefix));
        }
    }

    /// Send a request, retrying transient failures per the retry policy.
    ///
    /// A response with a non-retryable status is returned as-is; callers map it
    /// to [`CcError::Status`]. If the connectivity monitor reports offline when
    /// a retry wait would begin, the wait is skipped and the call fails with
    /// [`CcError::Offline`].
    pub(crate) async fn send_with_retry(
        &self,
        req: reqwest::RequestBuilder,
        retry_override: Option<&RetryConfig>,
    ) -> Result<reqwest::Response, CcError> {
        let cfg = retry_override.unwrap_or(&self.retry);
        if !cfg.enabled {
            return Ok(req.send().await?);
        }

        let mut attempt: u32 = 0;
        loop {
            let this_try = req.try_clone().ok_or_else(|| {
                CcError::Data("request body is not cloneable; disable retries for streaming bodies".into())
            })?;

            match this_try.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if !cfg.should_retry_status(status) || attempt >= cfg.max_retries {
                        return Ok(resp);
                    }
                    debug!(status, attempt, "retryable status");
                }
                Err(err) => {
                    if !cfg.should_retry_error(&err) || attempt >= cfg.max_retries {
                        return Err(err.into());
                    }
                    debug!(error = %err, attempt, "retryable transport error");
                }
            }

            if let Some(conn) = &self.connectivity
                && !conn.is_online()
            {
                return Err(CcError::Offline);
            }

            let delay = cfg.backoff.delay_for(attempt);
            attempt += 1;
            tokio::time::sleep(delay).await;
        }
    }

    /// [`send_with_retry`](Self::send_with_retry) with bearer authentication.
    ///
    /// Ensures credentials first (when an API key is configured), and replays the
    /// request once with fresh credentials on a 401.
    pub(crate) async fn send_authed(
        &self,
        req: reqwest::RequestBuilder,
        retry_override: Option<&RetryConfig>,
    ) -> Result<reqwest::Response, CcError> {
        if self.api_key.is_none() {
            return self.send_with_retry(req, retry_override).await;
        }

        // Clone before attaching the token so the replay gets a fresh one.
        let replay = req.try_clone();

        self.ensure_credentials().await?;
        let token = self
            .access_token()
            .await
            .ok_or_else(|| CcError::Auth("access token missing after refresh".into()))?;

        let resp = self.send_with_retry(req.bearer_auth(&token), retry_override).await?;
        if resp.status().as_u16() != 401 {
            return Ok(resp);
        }

        let Some(replay) = replay else {
            return Ok(resp);
        };

        debug!("access token rejected, refreshing credentials and replaying once");
        self.clear_access_token().await;
        self.ensure_credentials().await?;
        let token = self
            .access_token()
            .await
            .ok_or_else(|| CcError::Auth("access token missing after refresh".into()))?;
        self.send_with_retry(replay.bearer_auth(&token), retry_override).await
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct CcClientBuilder {
    user_agent: Option<String>,
    base_api: Option<Url>,
    token_url: Option<Url>,
    probe_url: Option<Url>,
    api_key: Option<String>,

    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,

    cache_ttl: Option<Duration>,
    cache_storage: Option<Box<dyn CacheStorage>>,

    retry: Option<RetryConfig>,
    connectivity: Option<ConnectivityHandle>,
}

impl CcClientBuilder {
    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override the REST API base (e.g. `https://api.carbonconstruct.com.au/v1/`).
    #[must_use]
    pub fn base_api(mut self, url: Url) -> Self {
        self.base_api = Some(url);
        self
    }

    /// Override the token-exchange URL.
    #[must_use]
    pub fn token_url(mut self, url: Url) -> Self {
        self.token_url = Some(url);
        self
    }

    /// Override the reachability-probe URL used by the connectivity monitor.
    #[must_use]
    pub fn probe_url(mut self, url: Url) -> Self {
        self.probe_url = Some(url);
        self
    }

    /// Authenticate with this API key (exchanged for a short-lived access token
    /// on first use). Without a key, requests are sent unauthenticated.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a global request timeout (overall). Default: none.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Enable response caching with a default TTL.
    /// If not set, caching is disabled.
    #[must_use]
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Use a custom cache backend instead of the default in-memory store.
    /// Only takes effect together with [`cache_ttl`](Self::cache_ttl).
    #[must_use]
    pub fn cache_storage(mut self, storage: impl CacheStorage + 'static) -> Self {
        self.cache_storage = Some(Box::new(storage));
        self
    }

    /// Replace the default retry policy.
    #[must_use]
    pub fn retry_policy(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Share a connectivity handle so retries short-circuit while offline.
    #[must_use]
    pub fn connectivity(mut self, handle: ConnectivityHandle) -> Self {
        self.connectivity = Some(handle);
        self
    }

    pub fn build(self) -> Result<CcClient, CcError> {
        let base_api = self.base_api.map_or_else(|| Url::parse(DEFAULT_BASE_API), Ok)?;
        let token_url = self.token_url.map_or_else(|| Url::parse(DEFAULT_TOKEN_URL), Ok)?;
        let probe_url = self.probe_url.map_or_else(|| Url::parse(DEFAULT_PROBE_URL), Ok)?;

        let mut httpb =
            reqwest::Client::builder().user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));

        if let Some(t) = self.timeout {
            httpb = httpb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        let http = httpb.build()?;

        // Cache is enabled only when a TTL is provided.
        let cache = self.cache_ttl.map(|ttl| {
            let cache = match self.cache_storage {
                Some(storage) => TtlCache::from_boxed(storage, ttl),
                None => TtlCache::new(MemoryStorage::default(), ttl),
            };
            Arc::new(cache)
        });

        Ok(CcClient {
            http,
            base_api,
            token_url,
            probe_url,
            api_key: self.api_key,
            state: Arc::new(RwLock::new(AuthState::default())),
            credential_fetch_lock: Arc::new(tokio::sync::Mutex::new(())),
            cache,
            retry: self.retry.unwrap_or_default(),
            connectivity: self.connectivity,
        })
    }
}
