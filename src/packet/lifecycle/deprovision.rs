//! Deprovisioning and removal verification.
//!
//! The provider offers no explicit "device gone" signal, so removal is
//! inferred from the event log: an empty log after the delete request counts
//! as removed. The inference is isolated in [`removal_confirmed`].

use tracing::{debug, info, warn};

use crate::packet::PacketError;
use crate::packet::device::{DeleteDeviceRequest, Event};
use crate::packet::types::DeviceId;
use crate::transport::Transport;

use super::LifecycleManager;

/// Decides whether the post-delete event log proves the device is gone.
///
/// # Errors
///
/// Returns [`PacketError::VerificationFailed`] when any event remains.
pub fn removal_confirmed(device_id: &DeviceId, events: &[Event]) -> Result<(), PacketError> {
    if events.is_empty() {
        return Ok(());
    }
    Err(PacketError::VerificationFailed {
        device_id: device_id.to_string(),
        remaining: events.len(),
    })
}

impl<T: Transport> LifecycleManager<T> {
    /// Force-deletes `device_id` and verifies the removal.
    ///
    /// A failed delete request is logged and does not stop verification. A
    /// failed verification read counts as an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::MissingParameter`] for an empty identifier and
    /// [`PacketError::VerificationFailed`] when events are still reported.
    pub async fn remove_device(&self, device_id: &DeviceId) -> Result<(), PacketError> {
        if device_id.is_empty() {
            return Err(PacketError::MissingParameter(String::from("device id")));
        }

        let body = serde_json::to_vec(&DeleteDeviceRequest::forced()).unwrap_or_else(|err| {
            warn!(device_id = %device_id, error = %err, "could not encode delete body, sending none");
            Vec::new()
        });

        let path = format!("devices/{device_id}");
        info!(device_id = %device_id, "deleting device");
        if let Err(err) = self.transport.delete(&path, body).await {
            warn!(device_id = %device_id, error = %err, "delete request failed, verifying anyway");
        }

        let remaining = match self.device_events(device_id).await {
            Ok(events) => events,
            Err(err) => {
                debug!(device_id = %device_id, error = %err, "event lookup failed after delete");
                Vec::new()
            }
        };

        removal_confirmed(device_id, &remaining)?;
        info!(device_id = %device_id, "device removed");
        Ok(())
    }
}
