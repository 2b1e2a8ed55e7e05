use super::{CommandMessage, StatusMessage};
use serde_json::Value;
use std::fmt;

/// Reasons an inbound bus payload is dropped
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Malformed(String),
    NotObject,
    MissingField(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "malformed JSON payload: {}", e),
            DecodeError::NotObject => write!(f, "payload must be a JSON object"),
            DecodeError::MissingField(field) => {
                write!(f, "payload missing string field '{}'", field)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a command-subject payload.
///
/// Unknown extra fields are ignored; `device_id` and `command` must be strings.
pub fn decode_command(payload: &[u8]) -> Result<CommandMessage, DecodeError> {
    let value = parse_object(payload)?;
    Ok(CommandMessage {
        device_id: string_field(&value, "device_id")?,
        command: string_field(&value, "command")?,
    })
}

/// Decode a status-subject payload.
pub fn decode_status(payload: &[u8]) -> Result<StatusMessage, DecodeError> {
    let value = parse_object(payload)?;
    Ok(StatusMessage {
        device_id: string_field(&value, "device_id")?,
        state: string_field(&value, "state")?,
    })
}

fn parse_object(payload: &[u8]) -> Result<Value, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::NotObject);
    }
    Ok(value)
}

fn string_field(value: &Value, field: &'static str) -> Result<String, DecodeError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(DecodeError::MissingField(field))
}
