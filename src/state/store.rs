use crate::device::{DeviceKind, DeviceState, CATALOG};
use crate::state::metrics::BridgeMetrics;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

struct DeviceRecord {
    id: String,
    name: String,
    kind: DeviceKind,
    state: DeviceState,
}

/// Read-only view of one device, as shown to observers
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceView {
    pub name: String,
    pub state: DeviceState,
}

/// Consistent copy of every device, in catalog order.
///
/// Serializes as a JSON object keyed by device id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSnapshot {
    devices: Vec<(String, DeviceView)>,
}

impl DeviceSnapshot {
    pub fn get(&self, device_id: &str) -> Option<&DeviceView> {
        self.devices
            .iter()
            .find(|(id, _)| id == device_id)
            .map(|(_, view)| view)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceView)> {
        self.devices.iter().map(|(id, view)| (id.as_str(), view))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Human-readable "<name> is <state>" list joined by "; "
    pub fn describe(&self) -> String {
        self.devices
            .iter()
            .map(|(_, view)| format!("{} is {}", view.name, view.state))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Serialize for DeviceSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.devices.len()))?;
        for (id, view) in &self.devices {
            map.serialize_entry(id, view)?;
        }
        map.end()
    }
}

/// Broadcast to observers whenever a stored state actually changes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreUpdate {
    pub device_id: String,
    pub name: String,
    pub old_state: DeviceState,
    pub new_state: DeviceState,
    pub timestamp: DateTime<Utc>,
}

/// What `apply_status` did with a status report
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Device id not in the store; ignored
    UnknownDevice,
    /// State string is not a valid state for this device; ignored
    InvalidState,
    /// Already in that state; nothing broadcast
    Unchanged(DeviceState),
    Changed(StoreUpdate),
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ApplyOutcome::Changed(_))
    }
}

/// Authoritative controller-side view of every device.
///
/// All reads and writes go through one lock, so a snapshot never mixes
/// states from before and after a concurrent update.
pub struct DeviceStore {
    devices: RwLock<Vec<DeviceRecord>>,
    update_tx: broadcast::Sender<StoreUpdate>,
    pub metrics: BridgeMetrics,
}

impl DeviceStore {
    /// Store seeded with the catalog's initial states
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_metrics(channel_capacity, BridgeMetrics::new())
    }

    /// Like `new`, but counting into counters shared with other participants
    pub fn with_metrics(channel_capacity: usize, metrics: BridgeMetrics) -> Self {
        let devices = CATALOG
            .iter()
            .map(|spec| DeviceRecord {
                id: spec.id.to_string(),
                name: spec.name.to_string(),
                kind: spec.kind,
                state: spec.initial_state,
            })
            .collect();
        let (update_tx, _) = broadcast::channel(channel_capacity.max(1));

        Self {
            devices: RwLock::new(devices),
            update_tx,
            metrics,
        }
    }

    /// Snapshot of all devices
    pub fn get_all(&self) -> DeviceSnapshot {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        DeviceSnapshot {
            devices: devices
                .iter()
                .map(|record| {
                    (
                        record.id.clone(),
                        DeviceView {
                            name: record.name.clone(),
                            state: record.state,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceView> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        devices
            .iter()
            .find(|record| record.id == device_id)
            .map(|record| DeviceView {
                name: record.name.clone(),
                state: record.state,
            })
    }

    /// Record a device's reported state.
    ///
    /// Re-applying the current state is a no-op, which makes duplicate
    /// deliveries harmless. Unknown ids and states foreign to the device's
    /// kind are ignored and only counted.
    pub fn apply_status(&self, device_id: &str, state: &str) -> ApplyOutcome {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);

        let Some(record) = devices.iter_mut().find(|record| record.id == device_id) else {
            warn!(device_id = %device_id, "Status for unknown device, ignoring");
            self.metrics.record_unknown_device();
            return ApplyOutcome::UnknownDevice;
        };

        let new_state = match DeviceState::parse(state) {
            Some(s) if record.kind.owns(s) => s,
            _ => {
                warn!(device_id = %device_id, state = %state, "Invalid state for device, ignoring");
                self.metrics.record_malformed();
                return ApplyOutcome::InvalidState;
            }
        };

        if record.state == new_state {
            debug!(device_id = %device_id, state = %new_state, "Duplicate status");
            self.metrics.record_duplicate();
            return ApplyOutcome::Unchanged(new_state);
        }

        let update = StoreUpdate {
            device_id: record.id.clone(),
            name: record.name.clone(),
            old_state: record.state,
            new_state,
            timestamp: Utc::now(),
        };
        record.state = new_state;
        self.metrics.record_applied();

        info!(device_id = %device_id, from = %update.old_state, to = %new_state, "Device state updated");

        // Sent under the write lock so observers see updates in apply order
        let _ = self.update_tx.send(update.clone());

        ApplyOutcome::Changed(update)
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.update_tx.subscribe()
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new(256)
    }
}
