// Simulated security devices: catalog, per-kind transition tables, agents

mod agent;
mod fleet;
mod motion;

pub use agent::DeviceAgent;
pub use fleet::DeviceFleet;
pub use motion::{MotionSimulation, SimulationConfig, SimulationHandle};

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DOOR_LOCK: &str = "door_lock_1";
pub const ALARM_SYSTEM: &str = "alarm_system";
pub const MOTION_SENSOR: &str = "motion_sensor_1";

/// Static description of a device known to the system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: DeviceKind,
    pub initial_state: DeviceState,
}

/// The fixed device set, in display order
pub static CATALOG: [DeviceSpec; 3] = [
    DeviceSpec {
        id: DOOR_LOCK,
        name: "Front Door Lock",
        kind: DeviceKind::DoorLock,
        initial_state: DeviceState::Locked,
    },
    DeviceSpec {
        id: ALARM_SYSTEM,
        name: "Alarm System",
        kind: DeviceKind::AlarmSystem,
        initial_state: DeviceState::Disarmed,
    },
    DeviceSpec {
        id: MOTION_SENSOR,
        name: "Living Room Sensor",
        kind: DeviceKind::MotionSensor,
        initial_state: DeviceState::Inactive,
    },
];

/// Look up a catalog entry by device id
pub fn find_spec(device_id: &str) -> Option<&'static DeviceSpec> {
    CATALOG.iter().find(|spec| spec.id == device_id)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    DoorLock,
    AlarmSystem,
    MotionSensor,
}

/// Union of every kind's state enum; `DeviceKind::owns` tells which belong where
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Locked,
    Unlocked,
    Armed,
    Disarmed,
    Active,
    Inactive,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Locked => "locked",
            DeviceState::Unlocked => "unlocked",
            DeviceState::Armed => "armed",
            DeviceState::Disarmed => "disarmed",
            DeviceState::Active => "active",
            DeviceState::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "locked" => Some(DeviceState::Locked),
            "unlocked" => Some(DeviceState::Unlocked),
            "armed" => Some(DeviceState::Armed),
            "disarmed" => Some(DeviceState::Disarmed),
            "active" => Some(DeviceState::Active),
            "inactive" => Some(DeviceState::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeviceKind {
    /// Map a command token to the state it requests for this kind.
    ///
    /// Tokens are trimmed and compared case-insensitively.
    pub fn resolve(&self, command: &str) -> Option<DeviceState> {
        let command = command.trim().to_lowercase();
        match self {
            DeviceKind::DoorLock => match command.as_str() {
                "lock" => Some(DeviceState::Locked),
                "unlock" => Some(DeviceState::Unlocked),
                _ => None,
            },
            DeviceKind::AlarmSystem => match command.as_str() {
                "armed" => Some(DeviceState::Armed),
                "disarmed" => Some(DeviceState::Disarmed),
                _ => None,
            },
            DeviceKind::MotionSensor => match command.as_str() {
                "active" | "activate" | "on" | "enable" => Some(DeviceState::Active),
                "inactive" | "deactivate" | "off" | "disable" => Some(DeviceState::Inactive),
                _ => None,
            },
        }
    }

    /// Whether `state` is a valid state for this kind
    pub fn owns(&self, state: DeviceState) -> bool {
        matches!(
            (self, state),
            (DeviceKind::DoorLock, DeviceState::Locked | DeviceState::Unlocked)
                | (DeviceKind::AlarmSystem, DeviceState::Armed | DeviceState::Disarmed)
                | (DeviceKind::MotionSensor, DeviceState::Active | DeviceState::Inactive)
        )
    }
}

/// Result of applying a command to a device state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: DeviceState,
    pub changed: bool,
}

/// Command not accepted by a device kind
#[derive(Debug, Clone, PartialEq)]
pub struct CommandError {
    pub kind: DeviceKind,
    pub command: String,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported command '{}' for {:?}", self.command, self.kind)
    }
}

impl std::error::Error for CommandError {}

/// Pure transition table shared by every agent.
///
/// Returns the resulting state and whether it differs from `current`.
pub fn apply_command(
    kind: DeviceKind,
    current: DeviceState,
    command: &str,
) -> Result<Transition, CommandError> {
    let target = kind.resolve(command).ok_or_else(|| CommandError {
        kind,
        command: command.to_string(),
    })?;

    Ok(Transition {
        state: target,
        changed: target != current,
    })
}
