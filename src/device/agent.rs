use crate::device::{apply_command, CommandError, DeviceSpec, DeviceState, Transition};
use crate::event::StatusMessage;
use crate::nats::Publisher;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Owns one simulated device's authoritative state.
///
/// Every read-modify-write of the state happens under `state`, and status
/// publication happens before the lock is released, so a device's status
/// events leave in the same order as its transitions.
pub struct DeviceAgent {
    spec: &'static DeviceSpec,
    pub(super) state: Mutex<DeviceState>,
    publisher: Arc<dyn Publisher>,
    status_subject: String,
}

impl DeviceAgent {
    /// Create the agent and publish its initial status.
    ///
    /// Failing to publish the initial status is fatal for the caller.
    pub async fn start(
        spec: &'static DeviceSpec,
        publisher: Arc<dyn Publisher>,
        status_subject: impl Into<String>,
    ) -> Result<Arc<Self>> {
        let agent = Arc::new(Self {
            spec,
            state: Mutex::new(spec.initial_state),
            publisher,
            status_subject: status_subject.into(),
        });

        agent
            .send_status(spec.initial_state)
            .await
            .with_context(|| format!("Failed to publish initial status for '{}'", spec.id))?;

        info!(device_id = %spec.id, state = %spec.initial_state, "Device online");
        Ok(agent)
    }

    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn spec(&self) -> &'static DeviceSpec {
        self.spec
    }

    pub async fn current_state(&self) -> DeviceState {
        *self.state.lock().await
    }

    /// Apply an inbound command.
    ///
    /// A command mapping to the current state is a no-op; a command this
    /// kind does not understand is rejected without touching state.
    pub async fn handle_command(&self, command: &str) -> Result<Transition, CommandError> {
        let mut state = self.state.lock().await;

        let transition = match apply_command(self.spec.kind, *state, command) {
            Ok(t) => t,
            Err(e) => {
                warn!(device_id = %self.spec.id, command = %command, "Unsupported command");
                return Err(e);
            }
        };

        if transition.changed {
            self.commit(&mut state, transition.state).await;
        } else {
            debug!(device_id = %self.spec.id, state = %transition.state, "Already in requested state");
        }

        Ok(transition)
    }

    /// Move to `target` while the caller holds the state lock.
    ///
    /// Returns false (and emits nothing) when already in `target`.
    pub(super) async fn commit(&self, state: &mut DeviceState, target: DeviceState) -> bool {
        if *state == target {
            return false;
        }

        let previous = *state;
        info!(
            device_id = %self.spec.id,
            from = %previous,
            to = %target,
            "Changing state"
        );
        *state = target;

        // The transition already happened on the device; a lost status event
        // only delays convergence of the controller's view.
        if let Err(e) = self.send_status(target).await {
            error!(device_id = %self.spec.id, error = %e, "Failed to publish status");
        }

        true
    }

    async fn send_status(&self, state: DeviceState) -> Result<()> {
        let msg = StatusMessage::new(self.spec.id, state.as_str());
        let payload = serde_json::to_vec(&msg).context("Failed to serialize status")?;

        self.publisher.publish(&self.status_subject, payload).await?;

        debug!(device_id = %self.spec.id, state = %state, "Published status");
        Ok(())
    }
}
