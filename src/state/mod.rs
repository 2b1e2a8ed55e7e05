// Controller-side device state store and bridge counters

mod metrics;
mod store;

pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use store::{ApplyOutcome, DeviceSnapshot, DeviceStore, DeviceView, StoreUpdate};
