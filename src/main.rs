//! Binary entry point for the `metal-lease` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use metal_lease::{
    ConfigError, DeviceId, HttpTransport, LifecycleManager, PacketConfig, ProvisionError,
    ProvisionOrchestrator, ProvisionReport, SelectedResources,
};

mod cli;

use cli::{Cli, DeprovisionCommand, ProvisionCommand, SelectCommand, SelectionArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Provision(#[from] ProvisionError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let mut config = PacketConfig::load_without_cli_args()?;
    match cli {
        Cli::Provision(args) => {
            apply_provision_overrides(&mut config, &args);
            provision(&config, args.hostname).await
        }
        Cli::Deprovision(args) => deprovision(&config, args).await,
        Cli::Select(args) => select(config, &args).await,
    }
}

async fn provision(config: &PacketConfig, hostname: Option<String>) -> Result<(), CliError> {
    let mut settings = config.lifecycle_settings()?;
    settings.hostname = hostname;
    let transport = HttpTransport::new(config.api_base.trim(), config.auth_token.trim());
    let orchestrator = ProvisionOrchestrator::new(LifecycleManager::new(transport, settings))
        .with_cancellation(cancel_on_interrupt());

    let report = orchestrator.execute(&config.selection()).await?;
    write_report(io::stdout(), &report);
    Ok(())
}

async fn deprovision(config: &PacketConfig, args: DeprovisionCommand) -> Result<(), CliError> {
    let orchestrator = orchestrator_for(config)?;
    let device_id = DeviceId::from(args.device_id);
    orchestrator.release(&device_id).await?;
    writeln!(io::stdout(), "device {device_id} removed").ok();
    Ok(())
}

async fn select(mut config: PacketConfig, args: &SelectCommand) -> Result<(), CliError> {
    apply_selection_overrides(&mut config, &args.selection);
    let orchestrator = orchestrator_for(&config)?;
    let selected = orchestrator.select(&config.selection()).await?;
    write_selection(io::stdout(), &selected);
    Ok(())
}

fn orchestrator_for(
    config: &PacketConfig,
) -> Result<ProvisionOrchestrator<HttpTransport>, CliError> {
    let settings = config.account_settings()?;
    let transport = HttpTransport::new(config.api_base.trim(), config.auth_token.trim());
    Ok(ProvisionOrchestrator::new(LifecycleManager::new(
        transport, settings,
    )))
}

fn apply_selection_overrides(config: &mut PacketConfig, args: &SelectionArgs) {
    if let Some(distro) = &args.distro {
        config.distro.clone_from(distro);
    }
    if let Some(plan_class) = &args.plan_class {
        config.plan_class.clone_from(plan_class);
    }
    if let Some(feature) = &args.facility_feature {
        config.facility_feature.clone_from(feature);
    }
    if args.any_facility {
        config.any_facility = true;
    }
}

fn apply_provision_overrides(config: &mut PacketConfig, args: &ProvisionCommand) {
    apply_selection_overrides(config, &args.selection);
    if args.user_data.is_some() || args.user_data_file.is_some() {
        config.user_data.clone_from(&args.user_data);
        config.user_data_file.clone_from(&args.user_data_file);
    }
    if let Some(interval) = args.poll_interval_secs {
        config.poll_interval_secs = interval;
    }
    if args.max_polls.is_some() {
        config.max_polls = args.max_polls;
    }
    if args.poll_timeout_secs.is_some() {
        config.poll_timeout_secs = args.poll_timeout_secs;
    }
}

/// Exit status used when a second interrupt abandons teardown.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Eq, PartialEq)]
enum Interrupts {
    /// The signal source failed or closed before a second interrupt.
    Unavailable,
    /// A second interrupt arrived after cancellation was requested.
    Forced,
}

/// The first interrupt flips `cancel` so provisioning stops and the device is
/// still torn down. A second interrupt reports [`Interrupts::Forced`].
async fn relay_interrupts<F, Fut>(
    mut next_interrupt: F,
    cancel: watch::Sender<bool>,
) -> Interrupts
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return Interrupts::Unavailable;
    }
    warn!("interrupt received, abandoning provisioning; interrupt again to exit without teardown");
    cancel.send_replace(true);

    if next_interrupt().await.is_err() {
        return Interrupts::Unavailable;
    }
    warn!("second interrupt received, exiting without teardown");
    Interrupts::Forced
}

/// Only the first Ctrl-C is graceful. The second exits immediately and may
/// leave the device running.
fn cancel_on_interrupt() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if relay_interrupts(tokio::signal::ctrl_c, tx).await == Interrupts::Forced {
            process::exit(FORCED_EXIT_CODE);
        }
    });
    rx
}

fn write_report(mut target: impl Write, report: &ProvisionReport) {
    let facility = report
        .selected
        .facility
        .as_ref()
        .map_or("any", |facility| facility.id.as_str());
    writeln!(
        target,
        "device {} ({}) provisioned with {} on {} in {}: {}",
        report.device.id,
        report.device.hostname,
        report.selected.operating_system.slug,
        report.selected.plan.id,
        facility,
        report.completion.body
    )
    .ok();
    writeln!(target, "device {} {}", report.device.id, report.state).ok();
}

fn write_selection(mut target: impl Write, selected: &SelectedResources) {
    let os = &selected.operating_system;
    writeln!(target, "operating system: {} ({})", os.slug, os.id).ok();
    writeln!(
        target,
        "plan: {} ({})",
        selected.plan.class, selected.plan.id
    )
    .ok();
    let facility = selected.facility.as_ref().map_or_else(
        || String::from("any"),
        |facility| format!("{} ({})", facility.code, facility.id),
    );
    writeln!(target, "facility: {facility}").ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
