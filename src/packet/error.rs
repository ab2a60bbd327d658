//! Error types for the Packet lifecycle manager.

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

use super::lifecycle::LifecycleState;

/// Errors raised while selecting catalog entries or driving a device through
/// its lifecycle.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PacketError {
    /// Raised when the caller supplies an empty selection criterion.
    #[error("invalid param: require '{field}' value to select {kind}")]
    InvalidParameter {
        /// Attribute the criterion is matched against.
        field: String,
        /// Catalog kind being searched.
        kind: String,
    },
    /// Raised when the provider payload carries an explicit error list.
    #[error("server error from '{path}': [{}]", .errors.join("; "))]
    ServerReported {
        /// API path that returned the errors.
        path: String,
        /// Errors reported by the provider.
        errors: Vec<String>,
    },
    /// Raised when no catalog entry satisfies the criterion.
    #[error("no available {kind} matching '{criterion}'")]
    NotFound {
        /// Catalog kind that was searched.
        kind: String,
        /// Criterion supplied by the caller.
        criterion: String,
    },
    /// Raised when a request body cannot be serialised.
    #[error("failed to encode {what}: {message}")]
    Encoding {
        /// Description of the value being encoded.
        what: String,
        /// Serialiser error message.
        message: String,
    },
    /// Raised when a response body cannot be parsed.
    #[error("failed to decode '{path}' response: {message}")]
    Decoding {
        /// API path that produced the body.
        path: String,
        /// Parser error message, including the offending payload.
        message: String,
    },
    /// Wrapper for transport level failures.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Raised when an entity required by a dependent call is absent.
    #[error("missing param: {0} required")]
    MissingParameter(String),
    /// Raised when a device has no events to report.
    #[error("no event reported for device {device_id}")]
    NoEvents {
        /// Device whose event log was empty.
        device_id: String,
    },
    /// Raised when the device still reports events after deletion.
    #[error("device {device_id} still reports {remaining} event(s) after deletion")]
    VerificationFailed {
        /// Device that was deleted.
        device_id: String,
        /// Number of events returned by the verification read.
        remaining: usize,
    },
    /// Raised when an opt-in polling bound is exceeded.
    #[error("device {device_id} not provisioned after {attempts} poll(s)")]
    PollTimeout {
        /// Device being polled.
        device_id: String,
        /// Number of polls issued before giving up.
        attempts: u32,
    },
    /// Raised when polling is cancelled by the caller.
    #[error("polling for device {device_id} was cancelled")]
    PollCancelled {
        /// Device being polled.
        device_id: String,
    },
    /// Raised when the poll task panics or is aborted.
    #[error("poll task for device {device_id} failed: {message}")]
    PollTask {
        /// Device being polled.
        device_id: String,
        /// Join error reported by the runtime.
        message: String,
    },
    /// Raised on a lifecycle transition the state machine does not allow.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        /// State before the attempted transition.
        from: LifecycleState,
        /// Requested state.
        to: LifecycleState,
    },
    /// Raised when configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for PacketError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
