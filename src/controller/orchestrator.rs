use crate::controller::EventLog;
use crate::event::{decode_status, CommandMessage};
use crate::interpreter::{interpret, Directive};
use crate::nats::Publisher;
use crate::state::{ApplyOutcome, DeviceSnapshot, DeviceStore, StoreUpdate};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Controller side of the system.
///
/// Turns observer text into published commands and inbound status payloads
/// into store updates. Observers learn about both through the event log and
/// the store's update channel.
pub struct Controller {
    store: Arc<DeviceStore>,
    log: EventLog,
    publisher: Arc<dyn Publisher>,
    command_subject: String,
}

impl Controller {
    pub fn new(
        store: Arc<DeviceStore>,
        log: EventLog,
        publisher: Arc<dyn Publisher>,
        command_subject: impl Into<String>,
    ) -> Self {
        Self {
            store,
            log,
            publisher,
            command_subject: command_subject.into(),
        }
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Announce a new observer and hand back the snapshot it should start from
    pub fn observer_connected(&self) -> DeviceSnapshot {
        self.store.metrics.increment_observers();
        self.log.record("Web dashboard connected to server.");
        self.store.get_all()
    }

    pub fn observer_disconnected(&self) {
        self.store.metrics.decrement_observers();
    }

    /// Interpret `text` and act on every directive it yields.
    ///
    /// Status queries are answered first from the store; control directives
    /// are then published one by one, and a failed publish does not stop
    /// the rest of the batch. Returns the interpreted directives.
    pub async fn handle_text_command(&self, text: &str) -> Vec<Directive> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.log.record(format!("Received voice command: '{}'", text));
        let directives = interpret(text);

        if directives.is_empty() {
            self.log.record(format!(
                "Could not understand command: '{}'. No action taken.",
                text
            ));
            return directives;
        }

        for directive in &directives {
            if *directive == Directive::QueryStatus {
                self.log.record("Processing status query.");
                let report = self.store.get_all().describe();
                self.log.record(format!("Current Status Report: {}.", report));
            }
        }

        for directive in &directives {
            if let Directive::Control { device_id, command } = directive {
                self.log.record(format!(
                    "NLP parsed: Control '{}' to state '{}'.",
                    device_id, command
                ));
                match self.publish_command(device_id, command).await {
                    Ok(payload) => {
                        self.store.metrics.record_published();
                        self.log.record(format!("Published command: {}", payload));
                    }
                    Err(e) => {
                        self.store.metrics.record_publish_failure();
                        warn!(device_id = %device_id, error = %e, "Publish failed");
                        self.log.record(format!("Failed to publish command: {:#}", e));
                    }
                }
            }
        }

        directives
    }

    async fn publish_command(&self, device_id: &str, command: &str) -> Result<String> {
        let payload = serde_json::to_string(&CommandMessage::new(device_id, command))
            .context("Failed to serialize command")?;

        self.publisher
            .publish(&self.command_subject, payload.clone().into_bytes())
            .await?;

        Ok(payload)
    }

    /// Apply one status-subject payload to the store.
    ///
    /// Returns the update when the stored state changed; malformed payloads,
    /// unknown devices and duplicates return `None`.
    pub fn handle_status_payload(&self, payload: &[u8]) -> Option<StoreUpdate> {
        let msg = match decode_status(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Dropping status payload");
                self.store.metrics.record_malformed();
                return None;
            }
        };

        match self.store.apply_status(&msg.device_id, &msg.state) {
            ApplyOutcome::Changed(update) => {
                self.log.record(format!(
                    "Device '{}' updated state to '{}'.",
                    update.name, update.new_state
                ));
                Some(update)
            }
            _ => None,
        }
    }

    /// Dispatch loop over payloads forwarded from the status subscription
    pub async fn run(&self, mut rx: mpsc::Receiver<Vec<u8>>) {
        info!("Controller status dispatcher started");
        while let Some(payload) = rx.recv().await {
            self.handle_status_payload(&payload);
        }
        warn!("Status channel closed, controller dispatcher exiting");
    }
}
