use crate::device::{
    DeviceAgent, MotionSimulation, SimulationConfig, SimulationHandle, Transition, ALARM_SYSTEM,
    CATALOG, MOTION_SENSOR,
};
use crate::event::decode_command;
use crate::nats::Publisher;
use crate::state::BridgeMetrics;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The device-side participant: every agent plus the motion simulation,
/// fed by the command subject.
pub struct DeviceFleet {
    agents: HashMap<&'static str, Arc<DeviceAgent>>,
    simulation: Option<SimulationHandle>,
    metrics: BridgeMetrics,
}

impl DeviceFleet {
    /// Bring every catalog device online (each publishes its initial status)
    /// and start the motion simulation if enabled.
    ///
    /// Dropped and rejected commands are counted into `metrics`.
    pub async fn start(
        publisher: Arc<dyn Publisher>,
        status_subject: &str,
        simulation: &SimulationConfig,
        metrics: BridgeMetrics,
    ) -> Result<Self> {
        let mut agents = HashMap::new();
        for spec in CATALOG.iter() {
            let agent = DeviceAgent::start(spec, Arc::clone(&publisher), status_subject).await?;
            agents.insert(spec.id, agent);
        }

        let mut fleet = Self {
            agents,
            simulation: None,
            metrics,
        };

        if simulation.enabled {
            let sensor = fleet.agent(MOTION_SENSOR).context("Motion sensor missing")?;
            let alarm = fleet.agent(ALARM_SYSTEM).context("Alarm system missing")?;
            let handle =
                MotionSimulation::new(Arc::clone(sensor), Arc::clone(alarm), simulation.clone())
                    .spawn();
            fleet.simulation = Some(handle);
        }

        info!(devices = fleet.agents.len(), "Device fleet running");
        Ok(fleet)
    }

    pub fn agent(&self, device_id: &str) -> Option<&Arc<DeviceAgent>> {
        self.agents.get(device_id)
    }

    pub fn metrics(&self) -> &BridgeMetrics {
        &self.metrics
    }

    /// Decode one command payload and hand it to its device.
    ///
    /// Malformed payloads, unknown devices and rejected commands are logged
    /// and counted; `None` means nothing was applied.
    pub async fn route_payload(&self, payload: &[u8]) -> Option<Transition> {
        let msg = match decode_command(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Dropping command payload");
                self.metrics.record_malformed();
                return None;
            }
        };

        let Some(agent) = self.agents.get(msg.device_id.as_str()) else {
            warn!(device_id = %msg.device_id, "Command for unknown device");
            self.metrics.record_unknown_device();
            return None;
        };

        match agent.handle_command(&msg.command).await {
            Ok(transition) => Some(transition),
            Err(e) => {
                warn!(device_id = %msg.device_id, error = %e, "Command rejected");
                self.metrics.record_rejected_command();
                None
            }
        }
    }

    /// Dispatch loop over payloads forwarded from the command subscription
    pub async fn run(&self, mut rx: mpsc::Receiver<Vec<u8>>) {
        while let Some(payload) = rx.recv().await {
            self.route_payload(&payload).await;
        }
        info!("Command channel closed, device fleet dispatcher exiting");
    }

    /// Stop the motion simulation
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.simulation.take() {
            handle.shutdown().await;
        }
    }
}
