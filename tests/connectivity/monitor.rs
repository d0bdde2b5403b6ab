use std::sync::Arc;
use std::time::{Duration, Instant};

use carbonconstruct_rs::connectivity::MonitorBuilder;
use carbonconstruct_rs::connectivity::debounce::DebounceConfig;
use carbonconstruct_rs::notifications::{NOTICE_CONNECTION_LOST, NOTICE_CONNECTION_RESTORED};
use httpmock::Method::HEAD;
use httpmock::MockServer;

use crate::common::{RecordingSink, SinkEvent, client_for};

async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn failing_probes_flip_offline_with_one_notification() {
    let server = MockServer::start();
    let probe = server.mock(|when, then| {
        when.method(HEAD).path("/v1/health");
        then.status(500);
    });

    let sink = Arc::new(RecordingSink::default());
    let client = client_for(&server);
    let (handle, connectivity) = MonitorBuilder::new(&client)
        .probe_interval(Duration::from_millis(20))
        .probe_timeout(Duration::from_millis(500))
        .debounce(DebounceConfig {
            offline_threshold: 2,
            // Wide enough that two consecutive probe failures form a streak.
            offline_window: Duration::from_secs(5),
            online_debounce: Duration::from_millis(50),
        })
        .notification_sink(sink.clone())
        .start();

    assert!(connectivity.is_online());
    assert!(
        wait_until(Duration::from_secs(3), || !connectivity.is_online()).await,
        "monitor never flipped offline"
    );
    assert!(probe.hits() >= 2);
    assert!(connectivity.state().consecutive_offline_signals >= 2);

    // Let a few more failing probes land; the notice must not repeat.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.notify_count(NOTICE_CONNECTION_LOST), 1);
    assert_eq!(sink.notify_count(NOTICE_CONNECTION_RESTORED), 0);

    handle.stop().await;
}

#[tokio::test]
async fn reported_signals_round_trip_with_debounced_recovery() {
    let server = MockServer::start();
    let _probe = server.mock(|when, then| {
        when.method(HEAD).path("/v1/health");
        then.status(200);
    });

    let sink = Arc::new(RecordingSink::default());
    let client = client_for(&server);
    let (handle, connectivity) = MonitorBuilder::new(&client)
        // Probe stays quiet for the duration of the test.
        .probe_interval(Duration::from_secs(60))
        .debounce(DebounceConfig {
            offline_threshold: 2,
            offline_window: Duration::from_millis(1200),
            online_debounce: Duration::from_millis(50),
        })
        .notification_sink(sink.clone())
        .start();

    handle.report_offline();
    handle.report_offline();
    assert!(
        wait_until(Duration::from_secs(2), || !connectivity.is_online()).await,
        "two reported signals did not flip the monitor offline"
    );

    handle.report_online();
    assert!(
        wait_until(Duration::from_secs(2), || connectivity.is_online()).await,
        "monitor never recovered"
    );

    assert_eq!(sink.notify_count(NOTICE_CONNECTION_LOST), 1);
    assert_eq!(sink.notify_count(NOTICE_CONNECTION_RESTORED), 1);
    // Recovery dismisses the stale "lost" notice before announcing itself.
    let events = sink.events();
    let dismiss_pos = events
        .iter()
        .position(|e| matches!(e, SinkEvent::Dismiss { id } if id == NOTICE_CONNECTION_LOST))
        .expect("lost notice was never dismissed");
    let restored_pos = events
        .iter()
        .position(
            |e| matches!(e, SinkEvent::Notify { id, .. } if id == NOTICE_CONNECTION_RESTORED),
        )
        .expect("restored notice missing");
    assert!(dismiss_pos < restored_pos);

    handle.stop().await;
}

#[tokio::test]
async fn stop_tears_the_task_down() {
    let server = MockServer::start();
    let _probe = server.mock(|when, then| {
        when.method(HEAD).path("/v1/health");
        then.status(200);
    });

    let client = client_for(&server);
    let (handle, mut connectivity) = MonitorBuilder::new(&client)
        .probe_interval(Duration::from_millis(20))
        .start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop().await;

    // The watch sender is gone, so a change wait returns immediately instead of
    // hanging on a leaked timer.
    tokio::time::timeout(Duration::from_secs(1), connectivity.changed())
        .await
        .expect("changed() hung after stop");
}
