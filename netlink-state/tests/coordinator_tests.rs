//! End-to-end coordinator behavior against a scripted client.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use netlink_api::{ClientError, ClientEvent, EventKind, MockNetlinkClient};
use netlink_state::{
    BusId, ConnectionPhase, SnapshotOrigin, StateChange, StateError, SyncCoordinator,
};

fn device_info_payload() -> serde_json::Value {
    json!({
        "device_id": "d1", "device_name": "Podium 3", "model": "NL-200",
        "version": "2.4.1", "api_version": "1.1", "mac_address": "aa:bb:cc:dd:ee:ff",
    })
}

fn desk_payload(height: f64) -> serde_json::Value {
    json!({
        "capabilities": ["height", "beep"],
        "height": height, "target": height, "moving": false,
        "mode": "manual", "beep": "off",
    })
}

fn display_payload(bus: &str, brightness: u8) -> serde_json::Value {
    json!({
        "bus": bus, "power": "on", "brightness": brightness,
        "volume": 30, "source": "hdmi1",
    })
}

/// Mock scripted with the standard single-display bootstrap fixture.
fn scripted_client() -> Arc<MockNetlinkClient> {
    let mock = MockNetlinkClient::new();
    mock.respond_device_info(Ok(device_info_payload()));
    mock.respond_desk_status(Ok(desk_payload(70.0)));
    mock.respond_displays(Ok(json!([{"bus": "1", "model": "VP-55", "type": "lcd"}])));
    mock.respond_display_status("1", Ok(display_payload("1", 50)));
    Arc::new(mock)
}

/// Poll until `predicate` holds or a 2s deadline passes.
async fn wait_for(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}

#[tokio::test]
async fn bootstrap_populates_snapshot_and_summaries() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 70.0);
    assert_eq!(
        snapshot.display(&BusId::new("1")).unwrap().state.brightness,
        50
    );

    let info = coordinator.device_info().unwrap();
    assert_eq!(info.device_id, "d1");

    let summaries = coordinator.display_summaries();
    assert_eq!(summaries[&BusId::new("1")].model.as_deref(), Some("VP-55"));

    assert!(coordinator.connection_healthy());
    assert_eq!(coordinator.connection_phase(), ConnectionPhase::Live);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn bootstrap_omits_failing_display_but_succeeds() {
    let mock = scripted_client();
    mock.respond_displays(Ok(json!([{"bus": "1"}, {"bus": "2"}])));
    mock.respond_display_status("2", Err(ClientError::Timeout("10s".to_string())));
    let coordinator = SyncCoordinator::new(mock.clone());

    coordinator.setup().await.unwrap();

    let snapshot = coordinator.snapshot().unwrap();
    assert!(snapshot.display(&BusId::new("1")).is_some());
    assert!(snapshot.display(&BusId::new("2")).is_none());

    // The failing bus is still listed; only its live state is missing.
    assert!(coordinator
        .display_summaries()
        .contains_key(&BusId::new("2")));

    coordinator.shutdown().await;
}

#[tokio::test]
async fn bootstrap_failure_aborts_with_no_state() {
    let mock = scripted_client();
    mock.respond_desk_status(Err(ClientError::Protocol("truncated frame".to_string())));
    let coordinator = SyncCoordinator::new(mock.clone());

    let err = coordinator.setup().await.unwrap_err();
    assert!(matches!(err, StateError::Setup(ClientError::Protocol(_))));
    assert!(coordinator.snapshot().is_none());
    assert!(coordinator.device_info().is_none());
}

#[tokio::test]
async fn auth_failure_is_distinct() {
    let mock = scripted_client();
    mock.respond_connect(Err(ClientError::Authentication("token revoked".to_string())));
    let coordinator = SyncCoordinator::new(mock.clone());

    let err = coordinator.setup().await.unwrap_err();
    assert!(matches!(
        err,
        StateError::Setup(ClientError::Authentication(_))
    ));
}

#[tokio::test]
async fn desk_event_updates_snapshot() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();
    let mut changes = coordinator.subscribe();

    mock.emit(ClientEvent::new(EventKind::DeskState, desk_payload(110.0)));

    wait_for(|| {
        coordinator
            .snapshot()
            .and_then(|s| s.desk.as_ref().map(|d| d.state.height))
            == Some(110.0)
    })
    .await;

    assert_eq!(changes.recv().await.unwrap(), StateChange::DeskUpdated);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn display_event_is_isolated_per_bus() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    mock.emit(ClientEvent::new(
        EventKind::DisplayState,
        display_payload("2", 80),
    ));

    wait_for(|| {
        coordinator
            .snapshot()
            .map(|s| s.display_count() == 2)
            .unwrap_or(false)
    })
    .await;

    let snapshot = coordinator.snapshot().unwrap();
    // Bus 1 and the desk are exactly as bootstrapped.
    assert_eq!(
        snapshot.display(&BusId::new("1")).unwrap().state.brightness,
        50
    );
    assert_eq!(snapshot.display(&BusId::new("2")).unwrap().state.brightness, 80);
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 70.0);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn malformed_desk_event_changes_nothing() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    let before = coordinator.snapshot().unwrap();

    // Missing `height`: rejected whole.
    mock.emit(ClientEvent::new(
        EventKind::DeskState,
        json!({"target": 110.0, "moving": true, "mode": "preset"}),
    ));
    // Follow with a valid display event so we can tell dispatch has drained.
    mock.emit(ClientEvent::new(
        EventKind::DisplayState,
        display_payload("2", 80),
    ));

    wait_for(|| {
        coordinator
            .snapshot()
            .map(|s| s.display_count() == 2)
            .unwrap_or(false)
    })
    .await;

    let after = coordinator.snapshot().unwrap();
    assert_eq!(after.desk, before.desk);
    assert_eq!(
        after.display(&BusId::new("1")),
        before.display(&BusId::new("1"))
    );

    coordinator.shutdown().await;
}

#[tokio::test]
async fn partial_display_patch_is_skipped() {
    // The §8 scenario: a power-only event must not half-apply. The wire
    // schema is full-record, so the patch is rejected and bus 1 keeps its
    // bootstrapped state entirely.
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    mock.emit(ClientEvent::new(
        EventKind::DisplayState,
        json!({"bus": "1", "power": "off"}),
    ));
    mock.emit(ClientEvent::new(
        EventKind::DisplayState,
        display_payload("2", 80),
    ));

    wait_for(|| {
        coordinator
            .snapshot()
            .map(|s| s.display_count() == 2)
            .unwrap_or(false)
    })
    .await;

    let display_one = coordinator.snapshot().unwrap();
    let display_one = display_one.display(&BusId::new("1")).unwrap();
    assert!(display_one.state.power.is_on());
    assert_eq!(display_one.state.brightness, 50);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn disconnect_degrades_without_erasing_state() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();
    let mut changes = coordinator.subscribe();

    mock.emit(ClientEvent::disconnected());

    wait_for(|| !coordinator.connection_healthy()).await;

    assert_eq!(coordinator.connection_phase(), ConnectionPhase::Degraded);
    // Stale-but-present beats absent.
    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 70.0);
    assert_eq!(changes.recv().await.unwrap(), StateChange::ConnectionLost);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn reconnect_triggers_full_rebootstrap() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();
    let mut changes = coordinator.subscribe();
    mock.clear_calls();

    // While we were "down", the device swapped its display for bus 2.
    mock.respond_desk_status(Ok(desk_payload(95.0)));
    mock.respond_displays(Ok(json!([{"bus": "2", "model": "VP-70"}])));
    mock.respond_display_status("2", Ok(display_payload("2", 60)));

    mock.emit(ClientEvent::disconnected());
    wait_for(|| !coordinator.connection_healthy()).await;
    mock.emit(ClientEvent::connected());

    wait_for(|| coordinator.connection_healthy()).await;

    // Fresh fetch sequence ran.
    assert_eq!(mock.call_count("get_displays"), 1);
    assert_eq!(mock.call_count("get_device_info"), 1);

    // Summary index replaced, not merged: bus 1 is gone from it.
    let summaries = coordinator.display_summaries();
    assert!(summaries.contains_key(&BusId::new("2")));
    assert!(!summaries.contains_key(&BusId::new("1")));

    // The snapshot is the re-fetched one.
    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 95.0);
    assert_eq!(snapshot.display(&BusId::new("2")).unwrap().state.brightness, 60);

    // Listeners saw the restore and the wholesale replace.
    let mut saw_restore = false;
    let mut saw_replace = false;
    while let Ok(change) = changes.try_recv() {
        match change {
            StateChange::ConnectionRestored => saw_restore = true,
            StateChange::SnapshotReplaced {
                origin: SnapshotOrigin::Rebootstrap,
            } => saw_replace = true,
            _ => {}
        }
    }
    assert!(saw_restore);
    assert!(saw_replace);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn connect_without_disconnect_does_not_rebootstrap() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();
    mock.clear_calls();

    // Some transports replay the handshake's connect event after setup.
    // With no disconnect in between there is no gap to recover, so no
    // second fetch sequence runs.
    mock.emit(ClientEvent::connected());
    // A follow-up event proves dispatch has drained past the connect.
    mock.emit(ClientEvent::new(EventKind::DeskState, desk_payload(71.0)));

    wait_for(|| {
        coordinator
            .snapshot()
            .and_then(|s| s.desk.as_ref().map(|d| d.state.height))
            == Some(71.0)
    })
    .await;

    assert_eq!(mock.call_count("get_displays"), 0);
    assert_eq!(mock.call_count("get_device_info"), 0);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn displays_list_event_replaces_summaries_only() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    mock.emit(ClientEvent::new(
        EventKind::DisplaysList,
        json!([{"bus": "2", "model": "VP-70"}]),
    ));

    wait_for(|| {
        coordinator
            .display_summaries()
            .contains_key(&BusId::new("2"))
    })
    .await;

    // Wholesale replace of the index...
    assert!(!coordinator
        .display_summaries()
        .contains_key(&BusId::new("1")));
    // ...but live display state is untouched (no pruning mid-session).
    let snapshot = coordinator.snapshot().unwrap();
    assert!(snapshot.display(&BusId::new("1")).is_some());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn shutdown_discards_in_flight_rebootstrap() {
    let mock = scripted_client();
    let coordinator = SyncCoordinator::new(mock.clone());
    coordinator.setup().await.unwrap();

    // Drop the link, slow the refetch down, then reconnect and shut down
    // while the re-bootstrap is still fetching.
    mock.emit(ClientEvent::disconnected());
    wait_for(|| !coordinator.connection_healthy()).await;
    mock.set_response_delay(Some(Duration::from_millis(100)));
    mock.respond_desk_status(Ok(desk_payload(95.0)));
    mock.emit(ClientEvent::connected());
    tokio::time::sleep(Duration::from_millis(20)).await;

    coordinator.shutdown().await;

    // Give the abandoned task time to finish fetching.
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Its results were discarded, not applied.
    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 70.0);
}

#[tokio::test]
async fn concurrent_merges_lose_no_update() {
    // Hammer the store from parallel writers through the real merge
    // functions: every bus's final value and the desk's final value must
    // all land, whatever the interleaving.
    use netlink_state::{merge, StateStore};

    let store = Arc::new(StateStore::new(64));
    let mut writers = Vec::new();

    for bus in ["1", "2", "3"] {
        let store = Arc::clone(&store);
        writers.push(std::thread::spawn(move || {
            for brightness in 0..=100u8 {
                store.update(|current| {
                    merge::merge_display_state(current, &display_payload(bus, brightness)).ok()
                });
            }
        }));
    }
    {
        let store = Arc::clone(&store);
        writers.push(std::thread::spawn(move || {
            for height in 0..=100 {
                store.update(|current| {
                    merge::merge_desk_state(current, &desk_payload(f64::from(height))).ok()
                });
            }
        }));
    }

    for writer in writers {
        writer.join().unwrap();
    }

    let snapshot = store.current().unwrap();
    assert_eq!(snapshot.desk.as_ref().unwrap().state.height, 100.0);
    for bus in ["1", "2", "3"] {
        assert_eq!(
            snapshot.display(&BusId::new(bus)).unwrap().state.brightness,
            100
        );
    }
}

mod merge_ordering {
    use super::display_payload;
    use netlink_state::{merge, BusId, Snapshot};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        /// Last-delivered-wins per bus: for any in-order delivery of
        /// full-record display events, each bus ends at its last value.
        #[test]
        fn last_event_per_bus_wins(events in prop::collection::vec((1u8..=3, 0u8..=100), 1..40)) {
            let mut snapshot: Option<Snapshot> = None;
            let mut expected: BTreeMap<String, u8> = BTreeMap::new();

            for (bus, brightness) in events {
                let bus = bus.to_string();
                let payload = display_payload(&bus, brightness);
                let (next, _) = merge::merge_display_state(snapshot.as_ref(), &payload).unwrap();
                snapshot = Some(next);
                expected.insert(bus, brightness);
            }

            let snapshot = snapshot.unwrap();
            prop_assert_eq!(snapshot.display_count(), expected.len());
            for (bus, brightness) in expected {
                prop_assert_eq!(
                    snapshot.display(&BusId::new(bus)).unwrap().state.brightness,
                    brightness
                );
            }
        }
    }
}
