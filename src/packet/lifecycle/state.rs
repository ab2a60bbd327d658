//! Explicit lifecycle state machine for a single device.

use std::fmt;

use super::super::PacketError;

/// Phase a device lease is in.
///
/// The happy path is strictly linear:
/// `Unselected → Selecting → Created → Provisioning → Ready → Deprovisioning → Removed`.
/// A provisioning device may also be abandoned straight to `Deprovisioning`
/// when polling is cancelled or times out.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LifecycleState {
    /// Nothing has been chosen yet.
    #[default]
    Unselected,
    /// Catalog entries are being selected.
    Selecting,
    /// The provider accepted the creation request.
    Created,
    /// Waiting for the completion marker in the event log.
    Provisioning,
    /// The completion marker was observed.
    Ready,
    /// A delete request has been issued.
    Deprovisioning,
    /// The post-delete event query came back empty.
    Removed,
}

impl LifecycleState {
    /// Returns whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unselected, Self::Selecting)
                | (Self::Selecting, Self::Created)
                | (Self::Created, Self::Provisioning)
                | (Self::Provisioning, Self::Ready | Self::Deprovisioning)
                | (Self::Ready, Self::Deprovisioning)
                | (Self::Deprovisioning, Self::Removed)
        )
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::InvalidTransition`] when `next` is not a legal
    /// successor.
    pub fn advance(self, next: Self) -> Result<Self, PacketError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(PacketError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns the lowercase phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unselected => "unselected",
            Self::Selecting => "selecting",
            Self::Created => "created",
            Self::Provisioning => "provisioning",
            Self::Ready => "ready",
            Self::Deprovisioning => "deprovisioning",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
