//! Packet (Equinix Metal) device lifecycle.
//!
//! Catalog records and selection live in [`catalog`] and [`selector`]; the
//! stateful create → poll → deprovision flow lives in [`lifecycle`].

pub mod catalog;
pub mod device;
mod error;
pub mod lifecycle;
pub mod selector;
pub mod types;

pub use catalog::{Facility, OperatingSystem, Plan};
pub use device::{ANY_FACILITY, CreateDeviceRequest, Device, Event};
pub use error::PacketError;
pub use lifecycle::{
    COMPLETION_MARKER, LifecycleManager, LifecycleSettings, LifecycleState, PollPolicy,
};
pub use types::{DeviceId, ProjectId};
