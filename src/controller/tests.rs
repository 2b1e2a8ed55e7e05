use super::*;
use crate::device::{DeviceState, ALARM_SYSTEM, DOOR_LOCK, MOTION_SENSOR};
use crate::interpreter::Directive;
use crate::nats::testing::RecordingPublisher;
use crate::state::DeviceStore;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

const COMMAND_SUBJECT: &str = "home.security.command";

fn make_controller() -> (Controller, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::new());
    let controller = Controller::new(
        Arc::new(DeviceStore::default()),
        EventLog::default(),
        publisher.clone(),
        COMMAND_SUBJECT,
    );
    (controller, publisher)
}

/// Drain every log entry currently buffered, without timestamps
fn drain_logs(rx: &mut broadcast::Receiver<LogEntry>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        let message = entry
            .log
            .split_once("] ")
            .map(|(_, m)| m.to_string())
            .unwrap_or(entry.log);
        lines.push(message);
    }
    lines
}

#[test]
fn test_log_entries_are_timestamped() {
    let log = EventLog::default();
    let entry = log.record("hello");
    // "[YYYY-MM-DD HH:MM:SS] hello"
    assert!(entry.log.starts_with('['));
    assert_eq!(entry.log.find(']'), Some(20));
    assert!(entry.log.ends_with("] hello"));
}

#[tokio::test]
async fn test_unlock_publishes_command() {
    let (controller, publisher) = make_controller();
    let mut logs = controller.log().subscribe();

    let directives = controller.handle_text_command("unlock the front door").await;

    assert_eq!(directives, vec![Directive::control(DOOR_LOCK, "unlock")]);
    assert_eq!(
        publisher.sent(),
        vec![(
            COMMAND_SUBJECT.to_string(),
            json!({"device_id": "door_lock_1", "command": "unlock"})
        )]
    );
    assert_eq!(
        drain_logs(&mut logs),
        vec![
            "Received voice command: 'unlock the front door'".to_string(),
            "NLP parsed: Control 'door_lock_1' to state 'unlock'.".to_string(),
            r#"Published command: {"device_id":"door_lock_1","command":"unlock"}"#.to_string(),
        ]
    );
    assert_eq!(controller.store().metrics.snapshot().commands_published, 1);
}

#[tokio::test]
async fn test_not_understood_contacts_no_device() {
    let (controller, publisher) = make_controller();
    let mut logs = controller.log().subscribe();

    let directives = controller.handle_text_command("sing me a song").await;

    assert!(directives.is_empty());
    assert!(publisher.sent().is_empty());
    assert_eq!(
        drain_logs(&mut logs),
        vec![
            "Received voice command: 'sing me a song'".to_string(),
            "Could not understand command: 'sing me a song'. No action taken.".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_empty_text_is_ignored() {
    let (controller, publisher) = make_controller();
    let mut logs = controller.log().subscribe();

    assert!(controller.handle_text_command("   ").await.is_empty());
    assert!(publisher.sent().is_empty());
    assert!(drain_logs(&mut logs).is_empty());
}

#[tokio::test]
async fn test_received_text_is_logged_as_sent() {
    let (controller, _) = make_controller();
    let mut logs = controller.log().subscribe();

    controller.handle_text_command("  arm the alarm ").await;

    assert_eq!(
        drain_logs(&mut logs)[0],
        "Received voice command: '  arm the alarm '"
    );
}

#[tokio::test]
async fn test_status_query_reported_before_publishing() {
    let (controller, publisher) = make_controller();
    let mut logs = controller.log().subscribe();

    controller
        .handle_text_command("turn on living room sensor and report status")
        .await;

    assert_eq!(
        publisher.payloads(),
        vec![json!({"device_id": "motion_sensor_1", "command": "active"})]
    );
    let lines = drain_logs(&mut logs);
    assert_eq!(lines[1], "Processing status query.");
    assert_eq!(
        lines[2],
        "Current Status Report: Front Door Lock is locked; Alarm System is disarmed; \
         Living Room Sensor is inactive."
    );
    assert_eq!(
        lines[3],
        "NLP parsed: Control 'motion_sensor_1' to state 'active'."
    );
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_batch() {
    let (controller, publisher) = make_controller();
    publisher.set_failing(true);
    let mut logs = controller.log().subscribe();

    let directives = controller
        .handle_text_command("lock the front door and arm the alarm")
        .await;
    assert_eq!(directives.len(), 2);

    let failures: Vec<_> = drain_logs(&mut logs)
        .into_iter()
        .filter(|line| line.starts_with("Failed to publish command:"))
        .collect();
    assert_eq!(failures.len(), 2);
    assert_eq!(controller.store().metrics.snapshot().publish_failures, 2);

    // Transport back: next command goes through
    publisher.set_failing(false);
    controller.handle_text_command("arm the alarm").await;
    assert_eq!(
        publisher.payloads(),
        vec![json!({"device_id": "alarm_system", "command": "armed"})]
    );
}

#[test]
fn test_status_payload_updates_store_and_logs() {
    let (controller, _) = make_controller();
    let mut logs = controller.log().subscribe();
    let mut updates = controller.store().subscribe();

    let update = controller
        .handle_status_payload(br#"{"device_id": "alarm_system", "state": "armed"}"#)
        .unwrap();

    assert_eq!(update.new_state, DeviceState::Armed);
    assert_eq!(
        controller.store().get(ALARM_SYSTEM).unwrap().state,
        DeviceState::Armed
    );
    assert_eq!(updates.try_recv().unwrap().device_id, ALARM_SYSTEM);
    assert_eq!(
        drain_logs(&mut logs),
        vec!["Device 'Alarm System' updated state to 'armed'.".to_string()]
    );
}

#[test]
fn test_duplicate_status_payload_is_silent() {
    let (controller, _) = make_controller();
    let mut logs = controller.log().subscribe();

    // Initial announcement matches the seeded state
    assert!(controller
        .handle_status_payload(br#"{"device_id": "motion_sensor_1", "state": "inactive"}"#)
        .is_none());
    assert!(drain_logs(&mut logs).is_empty());
}

#[test]
fn test_bad_status_payloads_are_dropped() {
    let (controller, _) = make_controller();
    let before = controller.store().get_all();

    assert!(controller.handle_status_payload(b"garbage").is_none());
    assert!(controller
        .handle_status_payload(br#"{"state": "armed"}"#)
        .is_none());
    assert!(controller
        .handle_status_payload(br#"{"device_id": "toaster", "state": "on"}"#)
        .is_none());

    assert_eq!(controller.store().get_all(), before);
    let metrics = controller.store().metrics.snapshot();
    assert_eq!(metrics.dropped_malformed, 2);
    assert_eq!(metrics.dropped_unknown_device, 1);
}

#[tokio::test]
async fn test_run_drains_status_channel() {
    let (controller, _) = make_controller();
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    tx.send(br#"{"device_id": "door_lock_1", "state": "unlocked"}"#.to_vec())
        .await
        .unwrap();
    tx.send(b"{oops".to_vec()).await.unwrap();
    tx.send(br#"{"device_id": "motion_sensor_1", "state": "active"}"#.to_vec())
        .await
        .unwrap();
    drop(tx);

    controller.run(rx).await;

    let snapshot = controller.store().get_all();
    assert_eq!(snapshot.get(DOOR_LOCK).unwrap().state, DeviceState::Unlocked);
    assert_eq!(snapshot.get(MOTION_SENSOR).unwrap().state, DeviceState::Active);
}

#[test]
fn test_observer_connect_logs_and_returns_snapshot() {
    let (controller, _) = make_controller();
    let mut logs = controller.log().subscribe();

    let snapshot = controller.observer_connected();

    assert_eq!(snapshot, controller.store().get_all());
    assert_eq!(
        drain_logs(&mut logs),
        vec!["Web dashboard connected to server.".to_string()]
    );
    assert_eq!(controller.store().metrics.snapshot().observer_connections, 1);

    controller.observer_disconnected();
    assert_eq!(controller.store().metrics.snapshot().observer_connections, 0);
}
