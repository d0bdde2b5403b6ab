//! Core components of the `carbonconstruct-rs` client.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`CcClient`] and its builder.
//! - The primary [`CcError`] type.
//! - The canonical backoff calculator and retry wrappers.
//! - The best-effort TTL cache.
//! - Shared data models like [`Project`] and [`EmissionFactor`].

/// The best-effort TTL cache and its pluggable storage backends.
pub mod cache;
/// The main client (`CcClient`), builder, and configuration.
pub mod client;
/// The primary error type (`CcError`) for the crate.
pub mod error;
/// Shared data models used across multiple API modules (e.g. `Project`, `EmissionFactor`).
pub mod models;
/// The canonical backoff calculator and the retry wrappers built on it.
pub mod retry;

pub(crate) mod net;

// convenient re-exports so most code can just `use crate::core::CcClient`
pub use cache::{CacheStorage, MemoryStorage, StorageError, TtlCache};
pub use client::{CacheMode, CcClient, CcClientBuilder, RetryConfig};
pub use error::CcError;
pub use models::{EmissionFactor, FactorCategory, Project, ProjectStatus};
pub use retry::{Backoff, RetryHooks, RetryPolicy, retry_strict, retry_with_recovery};
