// Keyword-based command interpreter: free text → device directives

use crate::device::{ALARM_SYSTEM, DOOR_LOCK, MOTION_SENSOR};
use serde::Serialize;


const FRONT_DOOR: [&str; 2] = ["front door", "front-door"];
const LIVING_ROOM: [&str; 2] = ["living room", "living-room"];
const TURN_ON: [&str; 4] = ["activate", "turn on", "enable", "on"];
const TURN_OFF: [&str; 4] = ["deactivate", "turn off", "disable", "off"];
const STATUS: [&str; 2] = ["status", "report"];

/// One interpreted instruction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Directive {
    /// Ask `device_id` to act on `command`
    Control {
        device_id: &'static str,
        command: &'static str,
    },
    /// Report every device's current state; no device is contacted
    QueryStatus,
}

impl Directive {
    pub fn control(device_id: &'static str, command: &'static str) -> Self {
        Directive::Control { device_id, command }
    }
}

/// Interpret an utterance.
///
/// Rules are checked independently in a fixed order (door lock, alarm,
/// motion sensor, status query) so one utterance can yield several
/// directives. An empty result means the utterance was not understood.
pub fn interpret(text: &str) -> Vec<Directive> {
    let text = text.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    let mut directives = Vec::new();

    // "lock" is a substring of "unlock": check unlock first
    if mentions(&FRONT_DOOR) {
        if text.contains("unlock") {
            directives.push(Directive::control(DOOR_LOCK, "unlock"));
        } else if text.contains("lock") {
            directives.push(Directive::control(DOOR_LOCK, "lock"));
        }
    }

    // Same for "arm" inside "disarm"
    if text.contains("alarm") {
        if text.contains("disarm") {
            directives.push(Directive::control(ALARM_SYSTEM, "disarmed"));
        } else if text.contains("arm") {
            directives.push(Directive::control(ALARM_SYSTEM, "armed"));
        }
    }

    // Both synonym sets may match one utterance; both directives are kept
    if mentions(&LIVING_ROOM) {
        if mentions(&TURN_ON) {
            directives.push(Directive::control(MOTION_SENSOR, "active"));
        }
        if mentions(&TURN_OFF) {
            directives.push(Directive::control(MOTION_SENSOR, "inactive"));
        }
    }

    if mentions(&STATUS) {
        directives.push(Directive::QueryStatus);
    }

    directives
}
