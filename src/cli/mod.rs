//! Command-line interface definitions for the `metal-lease` binary.
//!
//! The parser structures live here so both the binary and the build script
//! can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `metal-lease` binary.
#[derive(Debug, Parser)]
#[command(
    name = "metal-lease",
    about = "Lease a Packet bare-metal device: select, provision, wait, and release",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Select resources, create a device, wait for provisioning, then remove it.
    #[command(
        name = "provision",
        about = "Create a device, wait until it is provisioned, then remove it"
    )]
    Provision(ProvisionCommand),
    /// Force-delete an existing device and confirm its removal.
    #[command(
        name = "deprovision",
        about = "Force-delete a device and confirm its removal"
    )]
    Deprovision(DeprovisionCommand),
    /// Show which operating system, plan and facility would be chosen.
    #[command(
        name = "select",
        about = "Show the operating system, plan and facility that would be chosen"
    )]
    Select(SelectCommand),
}

/// Catalog selection overrides shared by `provision` and `select`.
#[derive(Debug, Args)]
pub(crate) struct SelectionArgs {
    /// Operating system distribution to select (for example `ubuntu`).
    #[arg(long, value_name = "DISTRO")]
    pub(crate) distro: Option<String>,
    /// Plan class to select (for example `c2.medium.x86`).
    #[arg(long, value_name = "CLASS")]
    pub(crate) plan_class: Option<String>,
    /// Facility feature to select (for example `global_ipv4`).
    #[arg(long, value_name = "FEATURE")]
    pub(crate) facility_feature: Option<String>,
    /// Let the provider choose the facility when none offers the feature.
    #[arg(long)]
    pub(crate) any_facility: bool,
}

/// Arguments for the `metal-lease provision` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProvisionCommand {
    #[command(flatten)]
    pub(crate) selection: SelectionArgs,
    /// Exact hostname for the device; a `<prefix>-<uuid>` name is generated
    /// otherwise.
    #[arg(long, value_name = "HOSTNAME")]
    pub(crate) hostname: Option<String>,
    /// User data passed to the device on first boot.
    #[arg(long, value_name = "USER_DATA", conflicts_with = "user_data_file")]
    pub(crate) user_data: Option<String>,
    /// Read user data from a local file.
    #[arg(long, value_name = "PATH", conflicts_with = "user_data")]
    pub(crate) user_data_file: Option<String>,
    /// Seconds between provisioning polls.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval_secs: Option<u64>,
    /// Stop waiting after this many polls and remove the device.
    #[arg(long, value_name = "COUNT")]
    pub(crate) max_polls: Option<u32>,
    /// Stop waiting after this many seconds and remove the device.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_timeout_secs: Option<u64>,
}

/// Arguments for the `metal-lease deprovision` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DeprovisionCommand {
    /// Identifier of the device to remove.
    #[arg(value_name = "DEVICE_ID")]
    pub(crate) device_id: String,
}

/// Arguments for the `metal-lease select` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct SelectCommand {
    #[command(flatten)]
    pub(crate) selection: SelectionArgs,
}
