//! Device lifecycle manager for the Packet API.
//!
//! The manager selects catalog entries, creates a device, waits for the
//! provider to report completion in the device event log and finally
//! deprovisions the device. Each phase lives in its own submodule and is
//! implemented on [`LifecycleManager`].

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

mod create;
mod deprovision;
mod poll;
mod select;
mod state;

pub use deprovision::removal_confirmed;
pub use poll::{COMPLETION_MARKER, is_provision_complete};
pub use state::LifecycleState;

use super::PacketError;
use super::types::ProjectId;
use crate::transport::Transport;

/// Interval between event polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Prefix for generated hostnames.
pub const DEFAULT_HOSTNAME_PREFIX: &str = "metal-lease";

/// Bounds applied to the provisioning poll loop.
///
/// Both bounds default to `None`, which polls until the completion marker is
/// observed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Fixed delay between ticks; the first tick fires one interval after
    /// polling starts.
    pub interval: Duration,
    /// Maximum number of polls before giving up.
    pub max_attempts: Option<u32>,
    /// Maximum time spent polling before giving up. The deadline also cuts
    /// short the wait for the next tick, so a timeout shorter than
    /// `interval` ends polling before the first fetch.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Unbounded polling at `interval`.
    #[must_use]
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    /// Caps the number of polls.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Caps the time spent polling.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.timeout.is_some_and(|limit| elapsed >= limit)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::every(DEFAULT_POLL_INTERVAL)
    }
}

/// Settings injected into the [`LifecycleManager`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LifecycleSettings {
    /// Project that owns plans, facilities and devices.
    pub project_id: ProjectId,
    /// Provisioning poll bounds.
    pub poll: PollPolicy,
    /// Prefix for generated hostnames (`<prefix>-<uuid>`).
    pub hostname_prefix: String,
    /// Exact hostname; replaces the generated one when set.
    pub hostname: Option<String>,
    /// Billing cycle requested at creation.
    pub billing_cycle: Option<String>,
    /// User data consumed on first boot.
    pub user_data: Option<String>,
    /// Tags applied to created devices.
    pub tags: Vec<String>,
}

impl LifecycleSettings {
    /// Settings for `project_id` with default polling and no extras.
    #[must_use]
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            poll: PollPolicy::default(),
            hostname_prefix: DEFAULT_HOSTNAME_PREFIX.to_owned(),
            hostname: None,
            billing_cycle: None,
            user_data: None,
            tags: Vec::new(),
        }
    }

    /// Overrides the poll policy.
    #[must_use]
    pub const fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// Drives one device through select, create, poll and deprovision.
///
/// The manager is cheap to clone; clones share the transport so the poll
/// phase can run on its own task.
pub struct LifecycleManager<T> {
    transport: Arc<T>,
    settings: Arc<LifecycleSettings>,
}

impl<T> Clone for LifecycleManager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<T> std::fmt::Debug for LifecycleManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> LifecycleManager<T> {
    /// Creates a manager over `transport`.
    #[must_use]
    pub fn new(transport: T, settings: LifecycleSettings) -> Self {
        Self {
            transport: Arc::new(transport),
            settings: Arc::new(settings),
        }
    }

    /// Returns the injected settings.
    #[must_use]
    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn decode<R: DeserializeOwned>(path: &str, payload: &[u8]) -> Result<R, PacketError> {
    serde_json::from_slice(payload).map_err(|err| PacketError::Decoding {
        path: path.to_owned(),
        message: format!("{err}; payload={}", String::from_utf8_lossy(payload)),
    })
}
