//! Device, event and request records exchanged with the device endpoints.

use serde::{Deserialize, Serialize};

use super::catalog::{Facility, OperatingSystem, Plan};
use super::types::DeviceId;

/// Facility identifier sent when no facility was selected.
pub const ANY_FACILITY: &str = "any";

/// Body of `POST /projects/{id}/devices`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateDeviceRequest {
    /// Facility identifier, or [`ANY_FACILITY`].
    pub facility: String,
    /// Plan identifier.
    pub plan: String,
    /// Operating system slug.
    pub operating_system: String,
    /// Hostname assigned to the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Billing cycle such as `hourly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<String>,
    /// User data consumed on first boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,
    /// Tags applied to the device.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Body of `DELETE /devices/{id}`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeleteDeviceRequest {
    /// Deletes the device even when it is still provisioning.
    pub force_delete: bool,
}

impl DeleteDeviceRequest {
    /// Builds a request with the force flag set.
    #[must_use]
    pub const fn forced() -> Self {
        Self { force_delete: true }
    }
}

/// Provisioned device as returned by the provider.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Device {
    /// Provider identifier; empty until creation succeeds.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub id: DeviceId,
    /// Short identifier shown in the provider console.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub short_id: String,
    /// Hostname assigned at creation.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub hostname: String,
    /// Free-form description.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub description: String,
    /// Provider state string (for example `provisioning`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub state: String,
    /// Creation timestamp.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub updated_at: String,
    /// Operating system the device was created with.
    pub operating_system: Option<OperatingSystem>,
    /// Plan the device was created with.
    pub plan: Option<Plan>,
    /// Facility the device was placed in.
    pub facility: Option<Facility>,
}

/// Entry in a device's server-owned event log.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Event {
    /// Provider identifier.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub id: String,
    /// Event message, inspected for the completion marker.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub body: String,
    /// Creation timestamp.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub created_at: String,
    /// Event type (for example `provisioning.104`).
    #[serde(deserialize_with = "super::types::null_as_default", rename = "type")]
    pub kind: String,
    /// Message with placeholders interpolated.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub interpolated: String,
    /// Source address, when reported.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub ip: String,
}

/// Response of `GET /devices/{id}/events`, newest event first.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct EventListing {
    /// Events in provider order.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub events: Vec<Event>,
    /// Provider-side errors, when present.
    pub errors: Option<Vec<String>>,
}
