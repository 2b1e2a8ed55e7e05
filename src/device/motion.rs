use crate::device::{DeviceAgent, DeviceState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Motion simulation configuration
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower bound of the idle sleep between checks (seconds)
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
    /// Upper bound of the idle sleep between checks (seconds, inclusive)
    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,
    /// Chance that an eligible check turns into a motion event
    #[serde(default = "default_trigger_probability")]
    pub trigger_probability: f64,
    /// How long the sensor stays active after a motion event (seconds)
    #[serde(default = "default_hold")]
    pub hold_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_min_interval() -> u64 {
    10
}

fn default_max_interval() -> u64 {
    25
}

fn default_trigger_probability() -> f64 {
    0.3
}

fn default_hold() -> u64 {
    5
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
            trigger_probability: default_trigger_probability(),
            hold_secs: default_hold(),
        }
    }
}

/// Autonomous motion detection for a sensor, gated on the alarm being armed
pub struct MotionSimulation {
    sensor: Arc<DeviceAgent>,
    alarm: Arc<DeviceAgent>,
    config: SimulationConfig,
}

/// Stops a running simulation
pub struct SimulationHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Signal the loop to stop and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

impl MotionSimulation {
    pub fn new(sensor: Arc<DeviceAgent>, alarm: Arc<DeviceAgent>, config: SimulationConfig) -> Self {
        Self {
            sensor,
            alarm,
            config,
        }
    }

    /// Run the loop on a background task with an entropy-seeded RNG
    pub fn spawn(self) -> SimulationHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            self.run(&mut rng, shutdown_rx).await;
        });

        SimulationHandle { shutdown_tx, task }
    }

    /// Loop until shutdown is signalled: sleep, check, maybe fire
    pub async fn run<R: Rng + Send>(&self, rng: &mut R, mut shutdown: watch::Receiver<bool>) {
        info!(device_id = %self.sensor.id(), "Motion simulation started");

        loop {
            let idle = self.next_interval(rng);
            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = shutdown.changed() => break,
            }

            if self.try_trigger(rng).await {
                let hold = Duration::from_secs(self.config.hold_secs);
                let stop = tokio::select! {
                    _ = tokio::time::sleep(hold) => false,
                    _ = shutdown.changed() => true,
                };
                self.release().await;
                if stop {
                    break;
                }
            }
        }

        info!(device_id = %self.sensor.id(), "Motion simulation stopped");
    }

    /// Idle sleep drawn uniformly from `[min, max]`; `max` below `min` collapses to `min`
    pub(super) fn next_interval<R: Rng>(&self, rng: &mut R) -> Duration {
        let min = self.config.min_interval_secs;
        let max = self.config.max_interval_secs.max(min);
        Duration::from_secs(rng.gen_range(min..=max))
    }

    /// One eligibility check.
    ///
    /// Fires only when the alarm is armed and the sensor is inactive; the
    /// random draw is made only in that case. Returns whether motion fired.
    pub async fn try_trigger<R: Rng>(&self, rng: &mut R) -> bool {
        let mut state = self.sensor.state.lock().await;
        if *state != DeviceState::Inactive {
            return false;
        }
        if self.alarm.current_state().await != DeviceState::Armed {
            return false;
        }
        if rng.gen::<f64>() >= self.config.trigger_probability {
            return false;
        }

        info!(device_id = %self.sensor.id(), "Motion detected");
        self.sensor.commit(&mut state, DeviceState::Active).await
    }

    /// End of the hold period: back to inactive unless something else already did it
    pub async fn release(&self) -> bool {
        let mut state = self.sensor.state.lock().await;
        self.sensor.commit(&mut state, DeviceState::Inactive).await
    }
}
