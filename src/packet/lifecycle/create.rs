//! Device creation helpers.
//!
//! Creation needs an operating system and a plan. The facility is optional:
//! without one the request asks the provider to place the device anywhere by
//! sending the [`ANY_FACILITY`] sentinel.

use tracing::info;
use uuid::Uuid;

use crate::packet::PacketError;
use crate::packet::catalog::{Facility, OperatingSystem, Plan};
use crate::packet::device::{ANY_FACILITY, CreateDeviceRequest, Device};
use crate::transport::Transport;

use super::{LifecycleManager, decode};

impl<T: Transport> LifecycleManager<T> {
    /// Builds the creation request for the selected entries.
    ///
    /// The facility identifier falls back to [`ANY_FACILITY`] when no
    /// facility is given.
    #[must_use]
    pub fn creation_request(
        &self,
        os: &OperatingSystem,
        plan: &Plan,
        facility: Option<&Facility>,
    ) -> CreateDeviceRequest {
        let facility_id = facility.map_or_else(
            || ANY_FACILITY.to_owned(),
            |selected| selected.id.clone(),
        );
        CreateDeviceRequest {
            facility: facility_id,
            plan: plan.id.clone(),
            operating_system: os.slug.clone(),
            hostname: Some(self.hostname()),
            billing_cycle: self.settings.billing_cycle.clone(),
            userdata: self.settings.user_data.clone(),
            tags: self.settings.tags.clone(),
        }
    }

    fn hostname(&self) -> String {
        self.settings.hostname.clone().unwrap_or_else(|| {
            format!(
                "{}-{}",
                self.settings.hostname_prefix,
                Uuid::new_v4().simple()
            )
        })
    }

    /// Requests a new device and returns the provider's record of it.
    ///
    /// The request is sent exactly once; failures are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::MissingParameter`] before any request when the
    /// operating system or plan is absent, [`PacketError::Encoding`] when the
    /// request cannot be serialised, [`PacketError::Transport`] when the call
    /// fails, and [`PacketError::Decoding`] when the response is not a device
    /// with an identifier.
    pub async fn create_device(
        &self,
        os: Option<&OperatingSystem>,
        plan: Option<&Plan>,
        facility: Option<&Facility>,
    ) -> Result<Device, PacketError> {
        let (Some(chosen_os), Some(chosen_plan)) = (os, plan) else {
            return Err(PacketError::MissingParameter(String::from(
                "operating-system and plan",
            )));
        };

        let request = self.creation_request(chosen_os, chosen_plan, facility);
        info!(
            distro = %chosen_os.distro,
            plan = %request.plan,
            facility = %request.facility,
            "creating device"
        );

        let body = serde_json::to_vec(&request).map_err(|err| PacketError::Encoding {
            what: String::from("device creation request"),
            message: err.to_string(),
        })?;
        let path = format!("projects/{}/devices", self.settings.project_id);
        let payload = self.transport.post(&path, body).await?;

        let device: Device = decode(&path, &payload)?;
        if device.id.is_empty() {
            return Err(PacketError::Decoding {
                path,
                message: String::from("device response carries no id"),
            });
        }

        info!(
            device_id = %device.id,
            hostname = %device.hostname,
            state = %device.state,
            "device created"
        );
        Ok(device)
    }
}
