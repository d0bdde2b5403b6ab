//! carbonconstruct-rs: ergonomic client for the CarbonConstruct embodied-carbon platform.
//!
//! The crate pairs a thin REST surface (projects, emission factors) with the
//! resilience layer the hosted app depends on: one canonical backoff/retry
//! engine, a debounced connectivity monitor, a best-effort TTL cache, and
//! deduplicated user notifications. Carbon estimation itself is pure,
//! client-side arithmetic in [`calculator`].
//!
//! ```no_run
//! use carbonconstruct_rs::{CcClient, calculator, factors};
//!
//! # async fn run() -> Result<(), carbonconstruct_rs::CcError> {
//! let client = CcClient::builder()
//!     .api_key("cc_live_...")
//!     .cache_ttl(std::time::Duration::from_secs(300))
//!     .build()?;
//!
//! let dataset = factors::FactorsBuilder::new(&client).region("AU").fetch().await?;
//! let inputs = calculator::ProjectInputs {
//!     materials: vec![calculator::LineInput::from_factor(1200.0, &dataset[0])],
//!     ..Default::default()
//! };
//! let summary = calculator::estimate(&inputs)?;
//! println!("total: {:.1} kg CO2e", summary.total_kg_co2e);
//! # Ok(())
//! # }
//! ```

pub mod calculator;
pub mod compliance;
pub mod connectivity;
pub mod core;
pub mod factors;
pub mod notifications;
pub mod projects;

pub use crate::compliance::{ComplianceResult, ComplianceRule, RuleTable};
pub use crate::connectivity::{
    ConnectivityHandle, ConnectivityState, MonitorBuilder, MonitorConfig, MonitorHandle,
};
pub use crate::core::{
    Backoff, CacheMode, CacheStorage, CcClient, CcClientBuilder, CcError, EmissionFactor,
    FactorCategory, MemoryStorage, Project, ProjectStatus, RetryConfig, RetryHooks, RetryPolicy,
    StorageError, TtlCache, retry_strict, retry_with_recovery,
};
pub use crate::factors::FactorsBuilder;
pub use crate::notifications::{NoopSink, NotificationSink};
pub use crate::projects::{NewProject, ProjectPatch, ProjectsBuilder};
