use chrono::Local;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

/// Timestamped, observer-facing log line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub log: String,
}

/// Event log fanned out to every connected observer
#[derive(Clone)]
pub struct EventLog {
    tx: broadcast::Sender<LogEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Stamp `message` with local time, trace it and broadcast it
    pub fn record(&self, message: impl AsRef<str>) -> LogEntry {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = LogEntry {
            log: format!("[{}] {}", timestamp, message.as_ref()),
        };

        info!(target: "homeguard::event_log", "{}", entry.log);

        // No observers connected is fine
        let _ = self.tx.send(entry.clone());
        entry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(256)
    }
}
