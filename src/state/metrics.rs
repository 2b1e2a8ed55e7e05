use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for traffic crossing the bus.
///
/// Dropped and rejected messages never raise errors, so these counters are
/// how they surface outside the logs.
#[derive(Clone, Default)]
pub struct BridgeMetrics {
    status_applied: Arc<AtomicU64>,
    status_duplicates: Arc<AtomicU64>,
    dropped_malformed: Arc<AtomicU64>,
    dropped_unknown_device: Arc<AtomicU64>,
    commands_rejected: Arc<AtomicU64>,
    commands_published: Arc<AtomicU64>,
    publish_failures: Arc<AtomicU64>,
    observer_connections: Arc<AtomicU64>,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        self.status_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.status_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.dropped_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_device(&self) {
        self.dropped_unknown_device.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_command(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.commands_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_observers(&self) {
        self.observer_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_observers(&self) {
        self.observer_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            status_applied: self.status_applied.load(Ordering::Relaxed),
            status_duplicates: self.status_duplicates.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_unknown_device: self.dropped_unknown_device.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            commands_published: self.commands_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            observer_connections: self.observer_connections.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub status_applied: u64,
    pub status_duplicates: u64,
    pub dropped_malformed: u64,
    pub dropped_unknown_device: u64,
    pub commands_rejected: u64,
    pub commands_published: u64,
    pub publish_failures: u64,
    pub observer_connections: u64,
}
