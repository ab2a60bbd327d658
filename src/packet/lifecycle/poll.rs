//! Provisioning poll loop over the device event log.
//!
//! The loop is a periodic timer rather than a free-running retry: each tick
//! fetches the newest event and finishes before the next tick is awaited, so
//! polls never overlap. Fetch and decode failures only produce warnings
//! because freshly created devices routinely report an empty log.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{info, warn};

use crate::packet::PacketError;
use crate::packet::device::{Event, EventListing};
use crate::packet::types::DeviceId;
use crate::transport::Transport;

use super::{LifecycleManager, decode};

/// Substring of the event body that signals provisioning finished.
pub const COMPLETION_MARKER: &str = "Provision complete";

/// Returns whether `event` carries the completion marker.
#[must_use]
pub fn is_provision_complete(event: &Event) -> bool {
    event.body.contains(COMPLETION_MARKER)
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let sender_gone = cancel.wait_for(|flag| *flag).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

impl<T: Transport> LifecycleManager<T> {
    /// Fetches every event recorded for `device_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::MissingParameter`] for an empty identifier,
    /// [`PacketError::Transport`] or [`PacketError::Decoding`] when the call
    /// fails, and [`PacketError::ServerReported`] when the payload carries an
    /// error list.
    pub async fn device_events(&self, device_id: &DeviceId) -> Result<Vec<Event>, PacketError> {
        if device_id.is_empty() {
            return Err(PacketError::MissingParameter(String::from("device id")));
        }

        let path = format!("devices/{device_id}/events");
        let payload = self.transport.get(&path).await?;
        let listing: EventListing = decode(&path, &payload)?;
        if let Some(errors) = listing.errors {
            return Err(PacketError::ServerReported { path, errors });
        }
        Ok(listing.events)
    }

    /// Returns the most recent event for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::NoEvents`] when the log is empty, otherwise the
    /// errors of [`Self::device_events`].
    pub async fn latest_event(&self, device_id: &DeviceId) -> Result<Event, PacketError> {
        self.device_events(device_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PacketError::NoEvents {
                device_id: device_id.to_string(),
            })
    }

    /// Polls the event log until an event carries [`COMPLETION_MARKER`].
    ///
    /// The first poll happens one interval after the call. With the default
    /// [`super::PollPolicy`] the loop has no upper bound; the only exits are
    /// the completion marker, an opt-in bound, or `cancel` flipping to
    /// `true`. A dropped cancellation sender never cancels.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::PollTimeout`] when a configured bound is
    /// exceeded and [`PacketError::PollCancelled`] on cancellation. Fetch
    /// failures are logged and never returned.
    pub async fn wait_for_provisioned(
        &self,
        device_id: &DeviceId,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Event, PacketError> {
        let policy = self.settings.poll;
        let started = Instant::now();
        let deadline = policy.timeout.map(|limit| started + limit);
        let mut ticker = interval_at(started + policy.interval, policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        info!(device_id = %device_id, "provisioning device, waiting for completion");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = cancelled(&mut cancel) => {
                    warn!(device_id = %device_id, attempts, "provisioning wait cancelled");
                    return Err(PacketError::PollCancelled {
                        device_id: device_id.to_string(),
                    });
                }
                () = sleep_until(deadline.unwrap_or(started)), if deadline.is_some() => {
                    warn!(device_id = %device_id, attempts, "provisioning wait timed out");
                    return Err(PacketError::PollTimeout {
                        device_id: device_id.to_string(),
                        attempts,
                    });
                }
            }

            attempts = attempts.saturating_add(1);
            match self.latest_event(device_id).await {
                Ok(event) => {
                    info!(
                        device_id = %device_id,
                        at = %event.created_at,
                        body = %event.body,
                        "device event"
                    );
                    if is_provision_complete(&event) {
                        return Ok(event);
                    }
                }
                Err(err) => {
                    warn!(device_id = %device_id, attempt = attempts, error = %err, "event poll failed");
                }
            }

            if policy.exhausted(attempts, started.elapsed()) {
                return Err(PacketError::PollTimeout {
                    device_id: device_id.to_string(),
                    attempts,
                });
            }
        }
    }
}

impl<T: Transport + 'static> LifecycleManager<T> {
    /// Runs [`Self::wait_for_provisioned`] on its own task.
    ///
    /// The device identifier moves into the task; the caller awaits the
    /// returned handle.
    #[must_use]
    pub fn spawn_provision_watch(
        &self,
        device_id: DeviceId,
        cancel: watch::Receiver<bool>,
    ) -> JoinHandle<Result<Event, PacketError>> {
        let manager = self.clone();
        tokio::spawn(async move { manager.wait_for_provisioned(&device_id, cancel).await })
    }
}
