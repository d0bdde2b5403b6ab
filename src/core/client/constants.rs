//! Centralized constants for default endpoints and UA.

/// Default UA identifying the crate (and version) to the API.
pub(crate) const USER_AGENT: &str = concat!("carbonconstruct-rs/", env!("CARGO_PKG_VERSION"));

/// CarbonConstruct REST API base (resource paths are appended).
pub(crate) const DEFAULT_BASE_API: &str = "https://api.carbonconstruct.com.au/v1/";

/// Endpoint exchanging an API key for a short-lived access token.
pub(crate) const DEFAULT_TOKEN_URL: &str = "https://api.carbonconstruct.com.au/v1/auth/token";

/// Lightweight same-origin health endpoint used by the reachability probe.
pub(crate) const DEFAULT_PROBE_URL: &str = "https://api.carbonconstruct.com.au/v1/health";
