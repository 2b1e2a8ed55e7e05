use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// Re-export section types defined next to their users
pub use crate::device::SimulationConfig;
pub use crate::nats::NatsConfig;

/// Complete HomeGuard configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeGuardConfig {
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub observers: ObserverConfig,
}

/// Observer-facing HTTP/WebSocket server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Allowed browser origins; empty allows any
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Fan-out channel sizing
#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    /// Buffered store updates / log entries per observer before it lags
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<HomeGuardConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: HomeGuardConfig = toml::from_str(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HomeGuardConfig::default();
        assert_eq!(config.nats.command_subject, "home.security.command");
        assert_eq!(config.nats.status_subject, "home.security.status");
        assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
        assert!(config.server.cors_allowed_origins.is_empty());
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.min_interval_secs, 10);
        assert_eq!(config.simulation.max_interval_secs, 25);
        assert_eq!(config.simulation.trigger_probability, 0.3);
        assert_eq!(config.simulation.hold_secs, 5);
        assert_eq!(config.observers.channel_capacity, 256);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [nats]
            url = "nats://broker.local:4222"
            command_subject = "lab.command"
            status_subject = "lab.status"

            [server]
            bind_addr = "127.0.0.1:8080"
            cors_allowed_origins = ["https://dashboard.example.com"]

            [simulation]
            enabled = false
            min_interval_secs = 1
            max_interval_secs = 2
            trigger_probability = 1.0
            hold_secs = 1

            [observers]
            channel_capacity = 16
        "#;

        let config: HomeGuardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.nats.url, "nats://broker.local:4222");
        assert_eq!(config.nats.command_subject, "lab.command");
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["https://dashboard.example.com".to_string()]
        );
        assert!(!config.simulation.enabled);
        assert_eq!(config.simulation.trigger_probability, 1.0);
        assert_eq!(config.observers.channel_capacity, 16);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [simulation]
            hold_secs = 9

            [nats]
            url = "nats://other:4222"
        "#;

        let config: HomeGuardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.simulation.hold_secs, 9);
        assert_eq!(config.simulation.min_interval_secs, 10);
        assert_eq!(config.nats.status_subject, "home.security.status");
        assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"127.0.0.1:9000\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_load_config_missing_file_fails() {
        let err = load_config("/nonexistent/homeguard.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
