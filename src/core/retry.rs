//! The canonical backoff calculator and generic retry wrappers.
//!
//! Every retry path in the crate (the HTTP client's [`send_with_retry`] loop and
//! the free-standing [`retry_with_recovery`] / [`retry_strict`] wrappers) computes
//! its delays through [`Backoff::delay_for`], so there is exactly one place where
//! the backoff curve and jitter live.
//!
//! [`send_with_retry`]: crate::core::client::CcClient

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::connectivity::ConnectivityHandle;
use crate::core::CcError;
use crate::notifications::{NOTICE_RETRIES_EXHAUSTED, NotificationSink};

/// Symmetric jitter applied to exponential delays when enabled (±15%).
const JITTER_RATIO: f64 = 0.15;

/// Specifies the backoff strategy for retrying failed operations.
#[derive(Clone, Debug)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed(Duration),
    /// Uses an exponential delay between retries.
    /// The delay is calculated as `min(base * factor^attempt, max)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (±15%) to the delay.
        jitter: bool,
    },
}

impl Backoff {
    /// Compute the delay before retrying after a failure of `attempt` (0-indexed).
    ///
    /// With jitter disabled the result is non-decreasing in `attempt` until it
    /// reaches the cap.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let base_ms = base.as_millis() as f64;
                let max_ms = max.as_millis() as f64;
                // Cap the exponent: 31 doublings already dwarfs any practical cap.
                let exp = attempt.min(31) as i32;
                let mut delay_ms = (base_ms * factor.powi(exp)).min(max_ms);
                if *jitter && delay_ms > 0.0 {
                    let spread = delay_ms * JITTER_RATIO;
                    delay_ms += rand::rng().random_range(-spread..=spread);
                }
                Duration::from_millis(delay_ms.max(0.0) as u64)
            }
        }
    }
}

/// Retry schedule for a generic async operation.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// The maximum number of retries. The total number of attempts is `max_retries + 1`.
    pub max_retries: u32,
    /// The backoff strategy applied between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(1000),
                factor: 2.0,
                max: Duration::from_secs(30),
                jitter: true,
            },
        }
    }
}

type RetryCallback = Box<dyn Fn(u32) + Send + Sync>;
type SuccessCallback = Box<dyn Fn() + Send + Sync>;
type FailureCallback = Box<dyn Fn(&CcError) + Send + Sync>;

/// Caller-supplied observability callbacks for the retry wrappers.
///
/// All callbacks are optional; an empty `RetryHooks::default()` is silent.
#[derive(Default)]
pub struct RetryHooks {
    on_retry: Option<RetryCallback>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl RetryHooks {
    /// Hooks that surface exhaustion to `sink` under the standard dedup id.
    /// Raw errors stay out of the user-facing message.
    #[must_use]
    pub fn notifying(sink: std::sync::Arc<dyn NotificationSink>) -> Self {
        Self::default().on_failure(move |_err| {
            sink.notify(
                NOTICE_RETRIES_EXHAUSTED,
                "Could not reach CarbonConstruct. Your changes are kept locally.",
            );
        })
    }

    /// Invoked before the wait preceding each retry, with the 1-indexed retry number.
    #[must_use]
    pub fn on_retry(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Box::new(f));
        self
    }

    /// Invoked once when an attempt succeeds.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Invoked once with the final error after the retry budget is exhausted.
    #[must_use]
    pub fn on_failure(mut self, f: impl Fn(&CcError) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    fn notify_retry(&self, attempt: u32) {
        if let Some(f) = &self.on_retry {
            f(attempt);
        }
    }

    fn notify_success(&self) {
        if let Some(f) = &self.on_success {
            f();
        }
    }

    fn notify_failure(&self, err: &CcError) {
        if let Some(f) = &self.on_failure {
            f(err);
        }
    }
}

impl std::fmt::Debug for RetryHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHooks")
            .field("on_retry", &self.on_retry.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Run `op` with retries, swallowing the final error.
///
/// Attempt 0 runs immediately. After a failure of attempt `k`, the wrapper waits
/// `policy.backoff.delay_for(k)` and tries again, up to `policy.max_retries`
/// retries. Intermediate failures are logged and reported through
/// `hooks.on_retry`; only exhaustion reaches `hooks.on_failure`, after which the
/// wrapper resolves to `None`.
///
/// If `connectivity` reports offline when a retry wait would begin, the wait is
/// skipped and the wrapper fails immediately with [`CcError::Offline`].
///
/// Independent invocations do not coordinate; each owns its attempt counter.
pub async fn retry_with_recovery<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: &RetryHooks,
    connectivity: Option<&ConnectivityHandle>,
    op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CcError>>,
{
    match run(policy, hooks, connectivity, op).await {
        Ok(v) => Some(v),
        Err(err) => {
            debug!(error = %err, "retries exhausted");
            hooks.notify_failure(&err);
            None
        }
    }
}

/// The stricter sibling of [`retry_with_recovery`]: identical schedule and
/// callbacks, but the final error is returned instead of swallowed.
pub async fn retry_strict<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: &RetryHooks,
    connectivity: Option<&ConnectivityHandle>,
    op: F,
) -> Result<T, CcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CcError>>,
{
    match run(policy, hooks, connectivity, op).await {
        Ok(v) => Ok(v),
        Err(err) => {
            hooks.notify_failure(&err);
            Err(err)
        }
    }
}

async fn run<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: &RetryHooks,
    connectivity: Option<&ConnectivityHandle>,
    mut op: F,
) -> Result<T, CcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CcError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(v) => {
                hooks.notify_success();
                return Ok(v);
            }
            Err(err) => {
                if attempt >= policy.max_retries {
                    return Err(err);
                }
                if let Some(conn) = connectivity
                    && !conn.is_online()
                {
                    debug!(attempt, "skipping retry wait: connectivity reports offline");
                    return Err(CcError::Offline);
                }
                let delay = policy.backoff.delay_for(attempt);
                attempt += 1;
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying"
                );
                hooks.notify_retry(attempt);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
