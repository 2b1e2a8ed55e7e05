use crate::nats::publisher::NatsPublisher;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// NATS configuration
#[derive(Clone, Debug, Deserialize)]
pub struct NatsConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Subject carrying controller → device commands
    #[serde(default = "default_command_subject")]
    pub command_subject: String,
    /// Subject carrying device → controller status reports
    #[serde(default = "default_status_subject")]
    pub status_subject: String,
}

fn default_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn default_command_subject() -> String {
    "home.security.command".to_string()
}

fn default_status_subject() -> String {
    "home.security.status".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            command_subject: default_command_subject(),
            status_subject: default_status_subject(),
        }
    }
}

/// One transport connection per participant (controller or device fleet)
pub struct NatsClient {
    client: async_nats::Client,
    config: NatsConfig,
}

impl NatsClient {
    /// Connect to NATS
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(&config.url)
            .await
            .with_context(|| format!("Failed to connect to NATS at {}", config.url))?;

        info!("Connected to NATS");
        Ok(Self { client, config })
    }

    /// Publisher sharing this connection
    pub fn publisher(&self) -> NatsPublisher {
        NatsPublisher::new(self.client.clone())
    }

    /// Subscribe to the status subject (controller side)
    pub async fn subscribe_status(&self) -> Result<async_nats::Subscriber> {
        self.subscribe(self.config.status_subject.clone()).await
    }

    /// Subscribe to the command subject (device side)
    pub async fn subscribe_commands(&self) -> Result<async_nats::Subscriber> {
        self.subscribe(self.config.command_subject.clone()).await
    }

    async fn subscribe(&self, subject: String) -> Result<async_nats::Subscriber> {
        info!(subject = %subject, "Subscribing");
        self.client
            .subscribe(subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to '{}'", subject))
    }

    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}
