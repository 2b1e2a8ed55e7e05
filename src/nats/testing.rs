use crate::nats::Publisher;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Publisher double recording every message; can be switched to fail
#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.sent().into_iter().map(|(_, payload)| payload).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("broker unreachable");
        }
        let value = serde_json::from_slice(&payload)?;
        self.sent.lock().unwrap().push((subject.to_string(), value));
        Ok(())
    }
}
