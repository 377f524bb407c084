//! Fleet runner: one concurrently running simulator per configured device.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use accessgen_domain::device::Device;
use accessgen_domain::error::{AccessGenError, ValidationError};
use accessgen_domain::settings::{BootConfig, RequestPacing};
use accessgen_domain::user::User;

use crate::dispatcher::SignedDispatcher;
use crate::error::ErrorChain;
use crate::guard::GuardConfig;
use crate::ports::transport::Transport;
use crate::simulator::EventSimulator;
use crate::uri::{EVENTS_PATH, UriResolver};

/// Outcome of a fleet run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetSummary {
    /// Devices whose simulator ran.
    pub started: usize,
    /// Devices rejected at setup.
    pub skipped: usize,
}

pub struct FleetRunner<T> {
    transport: Arc<T>,
    boot: BootConfig,
    pacing: RequestPacing,
    guard: GuardConfig,
    devices: Vec<Device>,
    users: Arc<[User]>,
}

impl<T: Transport> FleetRunner<T> {
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        boot: BootConfig,
        pacing: RequestPacing,
        devices: Vec<Device>,
        users: Vec<User>,
    ) -> Self {
        Self {
            transport,
            boot,
            pacing,
            guard: GuardConfig::default(),
            devices,
            users: users.into(),
        }
    }

    #[must_use]
    pub fn with_guard_config(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// Validate `device` and wire its dispatcher and simulator.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the device is incomplete, its key is
    /// malformed, its events URI cannot be built, or the user pool is empty.
    pub fn build_simulator(&self, device: &Device) -> Result<EventSimulator<T>, AccessGenError> {
        device.validate()?;
        if self.users.is_empty() {
            return Err(ValidationError::NoUsers.into());
        }
        let events_uri = UriResolver::new(&self.boot).resolve(EVENTS_PATH, &device.serial_number)?;
        let dispatcher = SignedDispatcher::new(device, &self.boot, Arc::clone(&self.transport))?
            .with_guard_config(self.guard);

        Ok(EventSimulator::new(
            device.clone(),
            Arc::clone(&self.users),
            self.pacing,
            dispatcher,
            events_uri,
        ))
    }

    /// Run every device until `shutdown` fires, then wait for all of them.
    ///
    /// A device that fails setup is logged and skipped; the others still run.
    pub async fn run(self, shutdown: CancellationToken) -> FleetSummary {
        let mut summary = FleetSummary::default();
        let mut handles = Vec::with_capacity(self.devices.len());

        for device in &self.devices {
            match self.build_simulator(device) {
                Ok(simulator) => {
                    handles.push(tokio::spawn(simulator.run(shutdown.clone())));
                    summary.started += 1;
                }
                Err(err) => {
                    tracing::error!(
                        device = %device.serial_number,
                        error = %ErrorChain(&err),
                        "device setup failed, not simulating"
                    );
                    summary.skipped += 1;
                }
            }
        }

        tracing::info!(started = summary.started, skipped = summary.skipped, "fleet running");

        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "simulator task failed");
            }
        }

        tracing::info!("fleet stopped");
        summary
    }
}
