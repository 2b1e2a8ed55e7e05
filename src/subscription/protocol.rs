use crate::state::DeviceSnapshot;
use serde::{Deserialize, Serialize};

/// Client → Server message types
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Free-text command; ignored when `text` is absent or empty
    ProcessCommand {
        #[serde(default)]
        text: Option<String>,
    },
}

/// Server → Client message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full device snapshot, keyed by device id
    StatusUpdate { devices: DeviceSnapshot },
    /// One timestamped event-log line
    LogEvent { log: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeviceStore;
    use serde_json::json;

    #[test]
    fn parses_process_command() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "process_command", "text": "arm the alarm"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::ProcessCommand {
                text: Some("arm the alarm".to_string())
            }
        );
    }

    #[test]
    fn missing_text_is_none() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "process_command"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ProcessCommand { text: None });
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "subscribe"}"#).is_err());
    }

    #[test]
    fn status_update_wire_format() {
        let msg = ServerMessage::StatusUpdate {
            devices: DeviceStore::default().get_all(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "status_update");
        assert_eq!(
            value["devices"]["door_lock_1"],
            json!({"name": "Front Door Lock", "state": "locked"})
        );
    }

    #[test]
    fn log_event_wire_format() {
        let msg = ServerMessage::LogEvent {
            log: "[2024-01-01 00:00:00] hi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "log_event", "log": "[2024-01-01 00:00:00] hi"})
        );
    }
}
