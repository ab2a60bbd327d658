//! Core library for the `metal-lease` bare-metal device tool.
//!
//! The crate leases one Packet device at a time: it selects an operating
//! system, plan and facility from the provider catalog, creates the device,
//! waits for the provider to report provisioning as complete, then
//! force-deletes the device and verifies its removal.

pub mod config;
pub mod packet;
pub mod provision;
pub mod test_support;
pub mod transport;
pub mod user_data;

pub use config::{ConfigError, PacketConfig};
pub use packet::{
    DeviceId, LifecycleManager, LifecycleSettings, LifecycleState, PacketError, PollPolicy,
    ProjectId,
};
pub use provision::{
    FacilityPolicy, ProvisionError, ProvisionOrchestrator, ProvisionReport, SelectedResources,
    Selection,
};
pub use transport::{HttpTransport, Method, Transport, TransportError};
pub use user_data::{UserDataError, UserDataSource, resolve_user_data};
