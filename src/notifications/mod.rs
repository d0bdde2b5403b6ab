//! Fire-and-forget user notifications with dedup-by-id semantics.
//!
//! The connectivity monitor (and application callbacks) talk to the user through
//! a [`NotificationSink`]; ids are fixed per condition so a sink can coalesce
//! repeats and dismiss a notice when the condition clears. Raw error objects are
//! never passed to a sink.

/// Dedup id for the "connection lost" notice.
pub const NOTICE_CONNECTION_LOST: &str = "connectivity/lost";
/// Dedup id for the "connection restored" notice.
pub const NOTICE_CONNECTION_RESTORED: &str = "connectivity/restored";
/// Dedup id applications conventionally use when a retry budget is exhausted.
pub const NOTICE_RETRIES_EXHAUSTED: &str = "sync/retries-exhausted";

/// Destination for user-facing notices.
///
/// `notify` must be idempotent per `id` (showing the same id twice coalesces);
/// `dismiss` removes the notice with that id, if present. Both are
/// fire-and-forget and must never block or fail.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, id: &str, message: &str);
    fn dismiss(&self, id: &str);
}

/// A sink that drops every notice. The default when none is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _id: &str, _message: &str) {}
    fn dismiss(&self, _id: &str) {}
}
