//! Orchestrates a full device lease: select, create, wait, release.

use std::fmt::Display;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::packet::{
    Device, DeviceId, Event, Facility, LifecycleManager, LifecycleState, OperatingSystem,
    PacketError, Plan,
};
use crate::transport::Transport;

/// What to do when no facility offers the requested feature.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FacilityPolicy {
    /// Abort the lease.
    #[default]
    Required,
    /// Let the provider place the device in any facility.
    FallbackToAny,
}

/// Selection criteria for one lease.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selection {
    /// Operating system distribution.
    pub distro: String,
    /// Plan class.
    pub plan_class: String,
    /// Facility feature.
    pub facility_feature: String,
    /// Behaviour when the facility lookup fails.
    pub facility_policy: FacilityPolicy,
}

/// Catalog entries chosen for a lease.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectedResources {
    /// Chosen operating system.
    pub operating_system: OperatingSystem,
    /// Chosen plan.
    pub plan: Plan,
    /// Chosen facility; `None` means the provider picks.
    pub facility: Option<Facility>,
}

/// Outcome of a completed lease.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionReport {
    /// Entries the device was created from.
    pub selected: SelectedResources,
    /// Device record returned at creation.
    pub device: Device,
    /// Event carrying the completion marker.
    pub completion: Event,
    /// Final lifecycle state.
    pub state: LifecycleState,
}

/// Errors raised by [`ProvisionOrchestrator`].
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A catalog lookup failed; nothing was created.
    #[error("resource selection failed: {0}")]
    Select(#[source] PacketError),
    /// The provider refused or failed the creation request.
    #[error("failed to create device: {0}")]
    Create(#[source] PacketError),
    /// Polling stopped before completion; the device was torn down.
    #[error("device did not finish provisioning: {message}")]
    Provisioning {
        /// Failure description including any teardown note.
        message: String,
        /// Underlying poll failure.
        #[source]
        source: PacketError,
    },
    /// Deletion could not be confirmed.
    #[error("failed to deprovision device {device_id}: {source}")]
    Deprovision {
        /// Device being released.
        device_id: DeviceId,
        /// Underlying failure.
        #[source]
        source: PacketError,
    },
    /// The orchestrator attempted an illegal state transition.
    #[error("lifecycle state error: {0}")]
    State(#[source] PacketError),
}

/// Drives a [`LifecycleManager`] through one complete lease.
#[derive(Debug)]
pub struct ProvisionOrchestrator<T> {
    manager: LifecycleManager<T>,
    cancel: watch::Receiver<bool>,
}

impl<T: Transport + 'static> ProvisionOrchestrator<T> {
    /// Creates an orchestrator whose polling is never cancelled.
    #[must_use]
    pub fn new(manager: LifecycleManager<T>) -> Self {
        let (_tx, cancel) = watch::channel(false);
        Self { manager, cancel }
    }

    /// Stops polling once `cancel` turns `true`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the wrapped manager.
    #[must_use]
    pub const fn manager(&self) -> &LifecycleManager<T> {
        &self.manager
    }

    /// Chooses an operating system, plan, and facility.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Select`] when any lookup fails. A failed
    /// facility lookup is tolerated under [`FacilityPolicy::FallbackToAny`].
    pub async fn select(&self, selection: &Selection) -> Result<SelectedResources, ProvisionError> {
        let operating_system = self
            .manager
            .select_operating_system(&selection.distro)
            .await
            .map_err(ProvisionError::Select)?;
        let plan = self
            .manager
            .select_plan(&selection.plan_class)
            .await
            .map_err(ProvisionError::Select)?;
        let facility = match self
            .manager
            .select_facility(&selection.facility_feature)
            .await
        {
            Ok(found) => Some(found),
            Err(err) if selection.facility_policy == FacilityPolicy::FallbackToAny => {
                warn!(error = %err, "no facility selected, letting the provider choose");
                None
            }
            Err(err) => return Err(ProvisionError::Select(err)),
        };
        Ok(SelectedResources {
            operating_system,
            plan,
            facility,
        })
    }

    /// Runs select, create, poll and deprovision in order.
    ///
    /// # Errors
    ///
    /// Returns the [`ProvisionError`] of the first failing phase. When polling
    /// fails the device is still deprovisioned, and a teardown failure is
    /// appended to the error message.
    pub async fn execute(&self, selection: &Selection) -> Result<ProvisionReport, ProvisionError> {
        let mut state = advance(LifecycleState::Unselected, LifecycleState::Selecting)?;
        let selected = self.select(selection).await?;

        let device = self
            .manager
            .create_device(
                Some(&selected.operating_system),
                Some(&selected.plan),
                selected.facility.as_ref(),
            )
            .await
            .map_err(ProvisionError::Create)?;
        state = advance(state, LifecycleState::Created)?;

        state = advance(state, LifecycleState::Provisioning)?;
        let completion = match self.watch(&device.id).await {
            Ok(event) => event,
            Err(err) => {
                let message = self.release_with_note(&device.id, &err).await;
                return Err(ProvisionError::Provisioning {
                    message,
                    source: err,
                });
            }
        };
        state = advance(state, LifecycleState::Ready)?;
        info!(device_id = %device.id, event = %completion.body, "device ready");

        state = advance(state, LifecycleState::Deprovisioning)?;
        self.release(&device.id).await?;
        state = advance(state, LifecycleState::Removed)?;
        info!(device_id = %device.id, "device removed");

        Ok(ProvisionReport {
            selected,
            device,
            completion,
            state,
        })
    }

    /// Deletes a device and confirms its removal.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Deprovision`] when removal is not confirmed.
    pub async fn release(&self, device_id: &DeviceId) -> Result<(), ProvisionError> {
        self.manager
            .remove_device(device_id)
            .await
            .map_err(|source| ProvisionError::Deprovision {
                device_id: device_id.clone(),
                source,
            })
    }

    async fn watch(&self, device_id: &DeviceId) -> Result<Event, PacketError> {
        let handle = self
            .manager
            .spawn_provision_watch(device_id.clone(), self.cancel.clone());
        handle.await.unwrap_or_else(|err| {
            Err(PacketError::PollTask {
                device_id: device_id.to_string(),
                message: err.to_string(),
            })
        })
    }

    async fn release_with_note<E: Display>(&self, device_id: &DeviceId, err: &E) -> String {
        let teardown_error = self.release(device_id).await.err();
        append_teardown_note(err.to_string(), teardown_error.as_ref())
    }
}

fn advance(from: LifecycleState, to: LifecycleState) -> Result<LifecycleState, ProvisionError> {
    from.advance(to).map_err(ProvisionError::State)
}

fn append_teardown_note<E: Display>(message: String, teardown_error: Option<&E>) -> String {
    if let Some(teardown) = teardown_error {
        format!("{message} (teardown also failed: {teardown})")
    } else {
        message
    }
}
