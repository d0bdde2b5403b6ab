#![allow(dead_code)]

use std::sync::Mutex;

use carbonconstruct_rs::CcClient;
use carbonconstruct_rs::notifications::NotificationSink;
use httpmock::MockServer;
use url::Url;

/// A client pointed at the mock server, without auth or caching.
pub fn client_for(server: &MockServer) -> CcClient {
    CcClient::builder()
        .base_api(Url::parse(&format!("{}/v1/", server.base_url())).unwrap())
        .token_url(Url::parse(&format!("{}/v1/auth/token", server.base_url())).unwrap())
        .probe_url(Url::parse(&format!("{}/v1/health", server.base_url())).unwrap())
        .build()
        .unwrap()
}

/// What a sink observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Notify { id: String, message: String },
    Dismiss { id: String },
}

/// A sink that records every call for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notify_count(&self, id: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Notify { id: got, .. } if got == id))
            .count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, id: &str, message: &str) {
        self.events.lock().unwrap().push(SinkEvent::Notify {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    fn dismiss(&self, id: &str) {
        self.events.lock().unwrap().push(SinkEvent::Dismiss { id: id.to_string() });
    }
}
