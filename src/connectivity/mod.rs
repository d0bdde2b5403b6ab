//! Network connectivity monitoring.
//!
//! A background task tracks a two-state (ONLINE/OFFLINE) machine fed by two
//! signal sources: external reports (the host application's own network events,
//! via [`MonitorHandle::report_online`] / [`MonitorHandle::report_offline`]) and
//! a periodic reachability probe against a lightweight health endpoint.
//! Transitions are debounced by [`debounce::DebounceState`] so momentary blips
//! never flap the public state, and each transition surfaces at most one
//! deduplicated user notification.
//!
//! The published state is a [`tokio::sync::watch`] channel: the monitor task is
//! the single writer, any number of [`ConnectivityHandle`] clones read it.

pub mod debounce;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::{
    select,
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};
use url::Url;

use crate::core::CcClient;
use crate::notifications::{
    NOTICE_CONNECTION_LOST, NOTICE_CONNECTION_RESTORED, NoopSink, NotificationSink,
};
use debounce::{DebounceConfig, DebounceState, Signal, Transition};

/* ---------------- Public API ---------------- */

/// A snapshot of the monitor's view of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    pub is_online: bool,
    /// Consecutive offline signals observed (resets on any online signal).
    pub consecutive_offline_signals: u32,
    /// When the monitor last evaluated a signal or probe.
    pub last_checked: DateTime<Utc>,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            is_online: true,
            consecutive_offline_signals: 0,
            last_checked: Utc::now(),
        }
    }
}

/// A cheap, cloneable reader of the monitor's published state.
///
/// The retry layer consumes this for its offline short-circuit.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    rx: watch::Receiver<ConnectivityState>,
}

impl ConnectivityHandle {
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.rx.borrow().is_online
    }

    #[must_use]
    pub fn state(&self) -> ConnectivityState {
        self.rx.borrow().clone()
    }

    /// Wait until the monitor publishes a new snapshot. Returns immediately once
    /// the monitor has stopped.
    pub async fn changed(&mut self) {
        let _ = self.rx.changed().await;
    }
}

/// Probe and debounce tuning for the monitor.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Probe cadence while the link looks healthy. Default: 30s.
    pub probe_interval: Duration,
    /// Probe cadence after repeated failures. Default: 60s.
    pub degraded_probe_interval: Duration,
    /// Consecutive probe failures before stretching the cadence. Default: 3.
    pub degraded_after: u32,
    /// Per-probe timeout. Default: 3s.
    pub probe_timeout: Duration,
    /// Transition debounce rules.
    pub debounce: DebounceConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            degraded_probe_interval: Duration::from_secs(60),
            degraded_after: 3,
            probe_timeout: Duration::from_secs(3),
            debounce: DebounceConfig::default(),
        }
    }
}

/// A handle for a running monitor task.
pub struct MonitorHandle {
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
    signal_tx: mpsc::Sender<Signal>,
}

impl MonitorHandle {
    /// Report an externally observed online signal (the browser `online`-event
    /// analogue). Dropped silently if the monitor is saturated or stopped.
    pub fn report_online(&self) {
        let _ = self.signal_tx.try_send(Signal::Online);
    }

    /// Report an externally observed offline signal.
    pub fn report_offline(&self) {
        let _ = self.signal_tx.try_send(Signal::Offline);
    }

    /// Politely ask the monitor to stop and wait for it to finish. All timers
    /// and the probe loop are released.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    /// Immediately abort the background task.
    pub fn abort(self) {
        self.join.abort();
    }
}

/// Builder to start a connectivity monitor.
pub struct MonitorBuilder {
    http: reqwest::Client,
    probe_url: Url,
    cfg: MonitorConfig,
    sink: Arc<dyn NotificationSink>,
}

impl MonitorBuilder {
    /// Start from an existing client (shares its HTTP pool and probe endpoint).
    #[must_use]
    pub fn new(client: &CcClient) -> Self {
        Self {
            http: client.http().clone(),
            probe_url: client.probe_url().clone(),
            cfg: MonitorConfig::default(),
            sink: Arc::new(NoopSink),
        }
    }

    /// Use a non-default probe endpoint (handy for tests/mocks).
    #[must_use]
    pub fn probe_url(mut self, url: Url) -> Self {
        self.probe_url = url;
        self
    }

    /// Probe cadence while healthy.
    #[must_use]
    pub fn probe_interval(mut self, dur: Duration) -> Self {
        self.cfg.probe_interval = dur;
        self
    }

    /// Probe cadence after repeated failures.
    #[must_use]
    pub fn degraded_probe_interval(mut self, dur: Duration) -> Self {
        self.cfg.degraded_probe_interval = dur;
        self
    }

    /// Per-probe timeout.
    #[must_use]
    pub fn probe_timeout(mut self, dur: Duration) -> Self {
        self.cfg.probe_timeout = dur;
        self
    }

    /// Replace the transition debounce rules.
    #[must_use]
    pub fn debounce(mut self, cfg: DebounceConfig) -> Self {
        self.cfg.debounce = cfg;
        self
    }

    /// Send transition notices to this sink (at most one per transition).
    #[must_use]
    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Spawn the monitor task. Returns the control handle and a state reader.
    ///
    /// Call `handle.stop().await` (or `handle.abort()`) on teardown so no timer
    /// outlives the consumer.
    #[must_use]
    pub fn start(self) -> (MonitorHandle, ConnectivityHandle) {
        let (state_tx, state_rx) = watch::channel(ConnectivityState::default());
        let (signal_tx, mut signal_rx) = mpsc::channel::<Signal>(32);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let http = self.http;
        let probe_url = self.probe_url;
        let cfg = self.cfg;
        let sink = self.sink;

        let join = tokio::spawn(async move {
            let mut machine = DebounceState::new(cfg.debounce.clone());
            let mut probe_failures: u32 = 0;
            let mut next_probe = Instant::now() + cfg.probe_interval;

            loop {
                // Wake for whichever comes first: the next probe or a pending
                // debounced transition.
                let wake = machine
                    .next_deadline()
                    .map_or(next_probe, |d| d.min(next_probe));

                select! {
                    _ = &mut stop_rx => break,
                    sig = signal_rx.recv() => {
                        let Some(sig) = sig else { break };
                        let transition = machine.on_signal(sig, Instant::now());
                        publish(&state_tx, &machine, transition, sink.as_ref());
                    }
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake)) => {
                        let now = Instant::now();
                        if let Some(transition) = machine.poll(now) {
                            publish(&state_tx, &machine, Some(transition), sink.as_ref());
                        }
                        if now >= next_probe {
                            let reachable = probe(&http, &probe_url, cfg.probe_timeout).await;
                            let sig = if reachable {
                                probe_failures = 0;
                                Signal::Online
                            } else {
                                probe_failures = probe_failures.saturating_add(1);
                                warn!(failures = probe_failures, url = %probe_url, "reachability probe failed");
                                Signal::Offline
                            };
                            let transition = machine.on_signal(sig, Instant::now());
                            publish(&state_tx, &machine, transition, sink.as_ref());

                            let cadence = if probe_failures >= cfg.degraded_after {
                                cfg.degraded_probe_interval
                            } else {
                                cfg.probe_interval
                            };
                            next_probe = Instant::now() + cadence;
                        }
                    }
                }
            }
        });

        (
            MonitorHandle {
                join,
                stop_tx: Some(stop_tx),
                signal_tx,
            },
            ConnectivityHandle { rx: state_rx },
        )
    }
}

/* ---------------- Internal ---------------- */

fn publish(
    tx: &watch::Sender<ConnectivityState>,
    machine: &DebounceState,
    transition: Option<Transition>,
    sink: &dyn NotificationSink,
) {
    let _ = tx.send(ConnectivityState {
        is_online: machine.is_online(),
        consecutive_offline_signals: machine.offline_signals(),
        last_checked: Utc::now(),
    });

    // The machine fires each transition once, so this cannot spam the sink.
    match transition {
        Some(Transition::WentOffline) => {
            sink.dismiss(NOTICE_CONNECTION_RESTORED);
            sink.notify(
                NOTICE_CONNECTION_LOST,
                "Connection lost. Changes will sync once you are back online.",
            );
        }
        Some(Transition::WentOnline) => {
            sink.dismiss(NOTICE_CONNECTION_LOST);
            sink.notify(NOTICE_CONNECTION_RESTORED, "Connection restored.");
        }
        None => {}
    }
}

async fn probe(http: &reqwest::Client, url: &Url, timeout: Duration) -> bool {
    let fut = http.head(url.clone()).send();
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(resp)) => resp.status().is_success(),
        Ok(Err(e)) => {
            debug!(error = %e, "reachability probe errored");
            false
        }
        Err(_) => {
            debug!("reachability probe timed out");
            false
        }
    }
}
