use serde::Serialize;

mod validation;
#[cfg(test)]
mod tests;

pub use validation::{decode_command, decode_status, DecodeError};

/// Controller → devices: request a device to act on `command`.
///
/// Payload on the command subject: `{"device_id": "...", "command": "..."}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandMessage {
    pub device_id: String,
    pub command: String,
}

/// Devices → controller: a device reporting its current state.
///
/// Payload on the status subject: `{"device_id": "...", "state": "..."}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub device_id: String,
    pub state: String,
}

impl CommandMessage {
    pub fn new(device_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            command: command.into(),
        }
    }
}

impl StatusMessage {
    pub fn new(device_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            state: state.into(),
        }
    }
}
