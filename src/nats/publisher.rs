use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Outbound side of the bus.
///
/// Controller and device agents publish through this trait so they can run
/// against a live connection, a disconnected placeholder, or a test recorder.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()>;
}

/// Core NATS publisher (fire-and-forget, no JetStream ack)
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        debug!(subject = %subject, bytes = payload.len(), "Publishing to NATS");

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to subject '{}'", subject))?;

        Ok(())
    }
}

/// Stand-in used when the broker could not be reached at startup.
///
/// Every publish fails with the recorded reason.
pub struct UnavailablePublisher {
    reason: String,
}

impl UnavailablePublisher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Publisher for UnavailablePublisher {
    async fn publish(&self, subject: &str, _payload: Vec<u8>) -> Result<()> {
        bail!("transport unavailable for '{}': {}", subject, self.reason)
    }
}
