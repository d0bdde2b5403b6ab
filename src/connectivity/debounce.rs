//! Pure transition rules for the connectivity state machine.
//!
//! Driven entirely by `(Signal, Instant)` pairs so the debounce behavior can be
//! exercised without timers. The async monitor in the parent module owns the
//! scheduling.

use std::time::{Duration, Instant};

/// A raw connectivity observation, before debouncing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Online,
    Offline,
}

/// A debounced state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

/// Debounce tuning for the connectivity state machine.
#[derive(Clone, Debug)]
pub struct DebounceConfig {
    /// Consecutive offline signals required to leave ONLINE.
    pub offline_threshold: u32,
    /// Window within which offline signals count as consecutive.
    pub offline_window: Duration,
    /// How long an online signal must stand unopposed before OFFLINE is left.
    pub online_debounce: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            offline_threshold: 2,
            offline_window: Duration::from_millis(1200),
            online_debounce: Duration::from_millis(500),
        }
    }
}

/// The two-state (ONLINE/OFFLINE) machine with debounced transitions.
///
/// Starts ONLINE. A single offline blip never flips the state; recovery is
/// applied only after the online signal has been stable for the configured
/// debounce (via [`poll`](Self::poll)).
#[derive(Debug)]
pub struct DebounceState {
    cfg: DebounceConfig,
    online: bool,
    offline_signals: u32,
    last_offline_signal: Option<Instant>,
    pending_online_since: Option<Instant>,
}

impl DebounceState {
    #[must_use]
    pub fn new(cfg: DebounceConfig) -> Self {
        Self {
            cfg,
            online: true,
            offline_signals: 0,
            last_offline_signal: None,
            pending_online_since: None,
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Current consecutive offline-signal count.
    #[must_use]
    pub fn offline_signals(&self) -> u32 {
        self.offline_signals
    }

    /// Feed one raw signal observed at `now`. Returns a transition if the
    /// signal completed one.
    pub fn on_signal(&mut self, signal: Signal, now: Instant) -> Option<Transition> {
        match signal {
            Signal::Offline => {
                // An opposing signal disarms any pending recovery.
                self.pending_online_since = None;

                if !self.online {
                    self.offline_signals = self.offline_signals.saturating_add(1);
                    self.last_offline_signal = Some(now);
                    return None;
                }

                // Signals outside the window don't form a streak.
                match self.last_offline_signal {
                    Some(prev) if now.duration_since(prev) <= self.cfg.offline_window => {
                        self.offline_signals = self.offline_signals.saturating_add(1);
                    }
                    _ => self.offline_signals = 1,
                }
                self.last_offline_signal = Some(now);

                if self.offline_signals >= self.cfg.offline_threshold {
                    self.online = false;
                    return Some(Transition::WentOffline);
                }
                None
            }
            Signal::Online => {
                self.offline_signals = 0;
                self.last_offline_signal = None;

                if self.online {
                    self.pending_online_since = None;
                    return None;
                }
                if self.pending_online_since.is_none() {
                    self.pending_online_since = Some(now);
                }
                // Applied by `poll` once the debounce has elapsed.
                None
            }
        }
    }

    /// Apply a pending debounced recovery if its stability window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Transition> {
        if let Some(since) = self.pending_online_since
            && now.duration_since(since) >= self.cfg.online_debounce
        {
            self.pending_online_since = None;
            self.online = true;
            return Some(Transition::WentOnline);
        }
        None
    }

    /// The instant at which a pending transition becomes due, if one is armed.
    /// The driver uses this to schedule its next wake-up.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_online_since.map(|since| since + self.cfg.online_debounce)
    }
}
