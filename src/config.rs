//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::packet::lifecycle::{DEFAULT_HOSTNAME_PREFIX, LifecycleSettings, PollPolicy};
use crate::provision::{FacilityPolicy, Selection};
use crate::transport::DEFAULT_API_BASE;
use crate::user_data::{UserDataError, resolve_user_data};

/// Packet account and provisioning defaults derived from environment
/// variables, configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "PACKET",
    discovery(
        app_name = "metal-lease",
        env_var = "METAL_LEASE_CONFIG_PATH",
        config_file_name = "metal-lease.toml",
        dotfile_name = ".metal-lease.toml",
        project_file_name = "metal-lease.toml"
    )
)]
pub struct PacketConfig {
    /// API token sent as `X-Auth-Token`. Required.
    pub auth_token: String,
    /// Project that owns plans, facilities and devices. Required.
    pub project_id: String,
    /// Base URL of the Packet API.
    #[ortho_config(default = DEFAULT_API_BASE.to_owned())]
    pub api_base: String,
    /// Operating system distribution to select.
    #[ortho_config(default = "ubuntu".to_owned())]
    pub distro: String,
    /// Plan class to select.
    #[ortho_config(default = "c2.medium.x86".to_owned())]
    pub plan_class: String,
    /// Facility feature to select.
    #[ortho_config(default = "global_ipv4".to_owned())]
    pub facility_feature: String,
    /// Let the provider place the device anywhere when no facility offers the
    /// requested feature. Disabled by default, which aborts instead.
    #[ortho_config(default = false)]
    pub any_facility: bool,
    /// Prefix for generated hostnames.
    #[ortho_config(default = DEFAULT_HOSTNAME_PREFIX.to_owned())]
    pub hostname_prefix: String,
    /// Billing cycle requested at creation.
    #[ortho_config(default = "hourly".to_owned())]
    pub billing_cycle: String,
    /// Inline user data for the first boot.
    pub user_data: Option<String>,
    /// Path to a user-data file. Supports `~/` expansion.
    pub user_data_file: Option<String>,
    /// Seconds between provisioning polls.
    #[ortho_config(default = 30)]
    pub poll_interval_secs: u64,
    /// Give up after this many polls. Unbounded when unset.
    pub max_polls: Option<u32>,
    /// Give up after polling for this many seconds. Unbounded when unset.
    pub poll_timeout_secs: Option<u64>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl PacketConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to metal-lease.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("metal-lease")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks the account fields every command needs: token, project and
    /// API base.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when one of them is empty.
    pub fn validate_account(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("Packet API token", "PACKET_AUTH_TOKEN", "auth_token"),
        )?;
        Self::require_field(
            &self.project_id,
            &FieldMetadata::new("Packet project ID", "PACKET_PROJECT_ID", "project_id"),
        )?;
        Self::require_field(
            &self.api_base,
            &FieldMetadata::new("Packet API base URL", "PACKET_API_BASE", "api_base"),
        )
    }

    /// Checks required fields and numeric bounds for provisioning. Error
    /// messages name the environment variable and file key that supply the
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_account()?;
        Self::require_field(
            &self.hostname_prefix,
            &FieldMetadata::new(
                "hostname prefix",
                "PACKET_HOSTNAME_PREFIX",
                "hostname_prefix",
            ),
        )?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_secs must be greater than zero",
            )));
        }
        if self.max_polls == Some(0) {
            return Err(ConfigError::Invalid(String::from(
                "max_polls must be greater than zero when set",
            )));
        }
        Ok(())
    }

    /// Builds the poll policy from the interval and optional bounds.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::every(Duration::from_secs(self.poll_interval_secs))
            .with_max_attempts(self.max_polls)
            .with_timeout(self.poll_timeout_secs.map(Duration::from_secs))
    }

    /// Builds lifecycle settings, resolving user data from its inline or file
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails or user data cannot be
    /// resolved.
    pub fn lifecycle_settings(&self) -> Result<LifecycleSettings, ConfigError> {
        self.validate()?;
        let user_data =
            resolve_user_data(self.user_data.as_deref(), self.user_data_file.as_deref())?;
        let billing_cycle = Some(self.billing_cycle.trim())
            .filter(|cycle| !cycle.is_empty())
            .map(str::to_owned);

        let mut settings =
            LifecycleSettings::new(self.project_id.trim()).with_poll(self.poll_policy());
        settings.hostname_prefix.clone_from(&self.hostname_prefix);
        settings.billing_cycle = billing_cycle;
        settings.user_data = user_data;
        Ok(settings)
    }

    /// Builds settings for `select` and `deprovision`, which never create a
    /// device. User data and provisioning bounds are not consulted, so a
    /// stale user-data source cannot block cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when an account field is empty.
    pub fn account_settings(&self) -> Result<LifecycleSettings, ConfigError> {
        self.validate_account()?;
        Ok(LifecycleSettings::new(self.project_id.trim()))
    }

    /// Returns the selection criteria and facility policy.
    #[must_use]
    pub fn selection(&self) -> Selection {
        let facility_policy = if self.any_facility {
            FacilityPolicy::FallbackToAny
        } else {
            FacilityPolicy::Required
        };
        Selection {
            distro: self.distro.clone(),
            plan_class: self.plan_class.clone(),
            facility_feature: self.facility_feature.clone(),
            facility_policy,
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when user data is malformed.
    #[error("invalid user data: {0}")]
    UserData(String),
    /// Raised when the user-data file cannot be read.
    #[error("failed to read user data file `{path}`: {message}")]
    UserDataFileRead {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl From<UserDataError> for ConfigError {
    fn from(value: UserDataError) -> Self {
        match value {
            UserDataError::FileRead { path, message } => Self::UserDataFileRead { path, message },
            other => Self::UserData(other.to_string()),
        }
    }
}
