use super::*;

#[test]
fn test_decode_valid_command() {
    let msg = decode_command(br#"{"device_id": "door_lock_1", "command": "unlock"}"#).unwrap();
    assert_eq!(msg, CommandMessage::new("door_lock_1", "unlock"));
}

#[test]
fn test_decode_valid_status_ignores_extra_fields() {
    let msg =
        decode_status(br#"{"device_id": "alarm_system", "state": "armed", "ts": 17}"#).unwrap();
    assert_eq!(msg, StatusMessage::new("alarm_system", "armed"));
}

#[test]
fn test_non_json_is_malformed() {
    let result = decode_status(b"not json at all");
    match result.unwrap_err() {
        DecodeError::Malformed(_) => {}
        other => panic!("Expected Malformed error, got {:?}", other),
    }
}

#[test]
fn test_json_array_is_rejected() {
    let result = decode_command(br#"["door_lock_1", "lock"]"#);
    assert_eq!(result.unwrap_err(), DecodeError::NotObject);
}

#[test]
fn test_missing_state_field() {
    let result = decode_status(br#"{"device_id": "alarm_system"}"#);
    assert_eq!(result.unwrap_err(), DecodeError::MissingField("state"));
}

#[test]
fn test_missing_device_id_field() {
    let result = decode_command(br#"{"command": "lock"}"#);
    assert_eq!(result.unwrap_err(), DecodeError::MissingField("device_id"));
}

#[test]
fn test_non_string_field_counts_as_missing() {
    let result = decode_status(br#"{"device_id": "alarm_system", "state": null}"#);
    assert_eq!(result.unwrap_err(), DecodeError::MissingField("state"));
}

#[test]
fn test_serialized_command_matches_wire_format() {
    let json = serde_json::to_value(CommandMessage::new("motion_sensor_1", "active")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"device_id": "motion_sensor_1", "command": "active"})
    );
}
