//! BDD step definitions for the device lifecycle.

use metal_lease::packet::COMPLETION_MARKER;
use metal_lease::test_support::{
    json_device, json_events, json_facilities, json_operating_systems, json_plans,
    request_failure,
};
use metal_lease::transport::Method;
use metal_lease::{DeviceId, LifecycleState, PacketError};
use rstest_bdd_macros::{given, then, when};
use tokio::sync::watch;

use super::test_helpers::{
    LifecycleContext, StepOutcome, default_selection, medium_plan, runtime, ubuntu,
};
use crate::test_constants::DEFAULT_PLAN_CLASS;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn outcome(context: &LifecycleContext) -> Result<&StepOutcome, StepError> {
    context
        .outcome
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("missing outcome")))
}

#[given("a project \"{project}\" on a scripted Packet API")]
fn scripted_project(mut lifecycle_context: LifecycleContext, project: String) -> LifecycleContext {
    lifecycle_context.project = project.trim().to_owned();
    lifecycle_context
}

#[given("the catalog lists ubuntu and centos operating systems")]
fn catalog_lists_operating_systems(lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context.transport.push_json(json_operating_systems(&[
        ("os-ubuntu", "ubuntu_20_04", "ubuntu", &[DEFAULT_PLAN_CLASS]),
        ("os-centos-retired", "centos_7", "centos", &[]),
        ("os-centos", "centos_8", "centos", &[DEFAULT_PLAN_CLASS]),
    ]));
    lifecycle_context
}

#[given("the catalog lists facilities offering only \"{feature}\"")]
fn catalog_lists_facilities(lifecycle_context: LifecycleContext, feature: String) -> LifecycleContext {
    lifecycle_context.transport.push_json(json_facilities(&[
        ("ewr1", &[feature.trim()]),
        ("ams1", &[feature.trim(), "baremetal"]),
    ]));
    lifecycle_context
}

#[given("the provider accepts device creation as \"{device_id}\"")]
fn provider_accepts_creation(
    lifecycle_context: LifecycleContext,
    device_id: String,
) -> LifecycleContext {
    lifecycle_context
        .transport
        .push_json(json_device(device_id.trim()));
    lifecycle_context
}

#[given("the event log fails {failures:u32} times before reporting completion")]
fn event_log_fails_then_completes(
    lifecycle_context: LifecycleContext,
    failures: u32,
) -> LifecycleContext {
    for _ in 0..failures {
        lifecycle_context
            .transport
            .push_error(request_failure(Method::Get, "devices/dev-1/events"));
    }
    let completion = format!("{COMPLETION_MARKER} in 312s");
    lifecycle_context
        .transport
        .push_json(json_events(&[completion.as_str(), "Installing"]));
    lifecycle_context
}

#[given("the event log is empty after deletion")]
fn event_log_empty_after_deletion(lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context.transport.push_json("");
    lifecycle_context.transport.push_json(json_events(&[]));
    lifecycle_context
}

#[given("the event log still lists events after deletion")]
fn event_log_lists_events_after_deletion(lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context.transport.push_json("");
    lifecycle_context
        .transport
        .push_json(json_events(&["Deprovisioning started"]));
    lifecycle_context
}

#[given("the provider completes a full lease for device \"{device_id}\"")]
fn provider_completes_lease(
    lifecycle_context: LifecycleContext,
    device_id: String,
) -> LifecycleContext {
    let transport = &lifecycle_context.transport;
    transport.push_json(json_operating_systems(&[(
        "os-ubuntu",
        "ubuntu_20_04",
        "ubuntu",
        &[DEFAULT_PLAN_CLASS],
    )]));
    transport.push_json(json_plans(&[("plan-medium", DEFAULT_PLAN_CLASS)]));
    transport.push_json(json_facilities(&[("ewr1", &["global_ipv4"])]));
    transport.push_json(json_device(device_id.trim()));
    transport.push_json(json_events(&["Provisioning"]));
    transport.push_json(json_events(&[COMPLETION_MARKER]));
    transport.push_json("");
    transport.push_json(json_events(&[]));
    lifecycle_context
}

#[when("I select the operating system for distro \"{distro}\"")]
fn select_operating_system(
    mut lifecycle_context: LifecycleContext,
    distro: String,
) -> LifecycleContext {
    let manager = lifecycle_context.manager();
    let result = runtime().block_on(async move { manager.select_operating_system(distro.trim()).await });
    lifecycle_context.outcome = Some(match result {
        Ok(os) => StepOutcome::OperatingSystem(os),
        Err(err) => StepOutcome::Failure(err),
    });
    lifecycle_context
}

#[when("I select the facility with feature \"{feature}\"")]
fn select_facility(mut lifecycle_context: LifecycleContext, feature: String) -> LifecycleContext {
    let manager = lifecycle_context.manager();
    let result = runtime().block_on(async move { manager.select_facility(feature.trim()).await });
    lifecycle_context.outcome = Some(match result {
        Ok(facility) => StepOutcome::Facility(facility),
        Err(err) => StepOutcome::Failure(err),
    });
    lifecycle_context
}

#[when("I create a device without a facility")]
fn create_without_facility(mut lifecycle_context: LifecycleContext) -> LifecycleContext {
    let manager = lifecycle_context.manager();
    let result = runtime().block_on(async move {
        manager
            .create_device(Some(&ubuntu()), Some(&medium_plan()), None)
            .await
    });
    lifecycle_context.outcome = Some(match result {
        Ok(device) => StepOutcome::Created(device.id),
        Err(err) => StepOutcome::Failure(err),
    });
    lifecycle_context
}

#[when("I wait for device \"{device_id}\" to be provisioned")]
fn wait_for_provisioned(
    mut lifecycle_context: LifecycleContext,
    device_id: String,
) -> LifecycleContext {
    let manager = lifecycle_context.manager();
    let id = DeviceId::from(device_id.trim());
    let result = runtime().block_on(async move {
        let (_tx, cancel) = watch::channel(false);
        manager.wait_for_provisioned(&id, cancel).await
    });
    lifecycle_context.outcome = Some(match result {
        Ok(event) => StepOutcome::Provisioned(event),
        Err(err) => StepOutcome::Failure(err),
    });
    lifecycle_context
}

#[when("I deprovision device \"{device_id}\"")]
fn deprovision_device(
    mut lifecycle_context: LifecycleContext,
    device_id: String,
) -> LifecycleContext {
    let manager = lifecycle_context.manager();
    let id = DeviceId::from(device_id.trim());
    let result = runtime().block_on(async move { manager.remove_device(&id).await });
    lifecycle_context.outcome = Some(match result {
        Ok(()) => StepOutcome::Removed,
        Err(err) => StepOutcome::Failure(err),
    });
    lifecycle_context
}

#[when("I run the full lease")]
fn run_full_lease(mut lifecycle_context: LifecycleContext) -> LifecycleContext {
    let orchestrator = lifecycle_context.orchestrator();
    let selection = default_selection();
    let result = runtime().block_on(async move { orchestrator.execute(&selection).await });
    lifecycle_context.outcome = Some(match result {
        Ok(report) => StepOutcome::Leased(Box::new(report)),
        Err(err) => StepOutcome::LeaseFailure(err.to_string()),
    });
    lifecycle_context
}

#[then("the selected entry is \"{id}\"")]
fn selected_entry_is(lifecycle_context: &LifecycleContext, id: String) -> Result<(), StepError> {
    let selected = match outcome(lifecycle_context)? {
        StepOutcome::OperatingSystem(os) => os.id.clone(),
        StepOutcome::Facility(facility) => facility.id.clone(),
        other => {
            return Err(StepError::Assertion(format!(
                "expected a selection, got: {other:?}"
            )));
        }
    };
    if selected == id.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {id}, selected {selected}"
        )))
    }
}

#[then("selection fails because no facility matches \"{feature}\"")]
fn selection_fails_not_found(
    lifecycle_context: &LifecycleContext,
    feature: String,
) -> Result<(), StepError> {
    match outcome(lifecycle_context)? {
        StepOutcome::Failure(PacketError::NotFound { kind, criterion })
            if kind == "facility" && criterion == feature.trim() =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected facility not found, got: {other:?}"
        ))),
    }
}

#[then("the creation request targets facility \"{facility}\"")]
fn creation_targets_facility(
    lifecycle_context: &LifecycleContext,
    facility: String,
) -> Result<(), StepError> {
    if !matches!(outcome(lifecycle_context)?, StepOutcome::Created(_)) {
        return Err(StepError::Assertion(String::from(
            "expected the device to be created",
        )));
    }
    let calls = lifecycle_context.transport.calls();
    let body = calls
        .iter()
        .find(|call| call.method == Method::Post)
        .and_then(metal_lease::test_support::TransportCall::body_json)
        .ok_or_else(|| StepError::Assertion(String::from("missing creation request")))?;
    if body["facility"] == facility.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected facility {facility}, got request {body}"
        )))
    }
}

#[then("provisioning completes after {polls:u32} polls")]
fn provisioning_completes(
    lifecycle_context: &LifecycleContext,
    polls: u32,
) -> Result<(), StepError> {
    let StepOutcome::Provisioned(event) = outcome(lifecycle_context)? else {
        return Err(StepError::Assertion(String::from(
            "expected provisioning to complete",
        )));
    };
    if !event.body.contains(COMPLETION_MARKER) {
        return Err(StepError::Assertion(format!(
            "unexpected completion event: {}",
            event.body
        )));
    }
    let observed = lifecycle_context.transport.call_count();
    if usize::try_from(polls).is_ok_and(|expected| expected == observed) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {polls} polls, observed {observed}"
        )))
    }
}

#[then("the device is confirmed removed")]
fn device_confirmed_removed(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match outcome(lifecycle_context)? {
        StepOutcome::Removed => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected removal, got: {other:?}"
        ))),
    }
}

#[then("deprovisioning fails verification")]
fn deprovisioning_fails_verification(
    lifecycle_context: &LifecycleContext,
) -> Result<(), StepError> {
    match outcome(lifecycle_context)? {
        StepOutcome::Failure(PacketError::VerificationFailed { remaining: 1, .. }) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected verification failure, got: {other:?}"
        ))),
    }
}

#[then("the lease ends with device \"{device_id}\" removed")]
fn lease_ends_removed(
    lifecycle_context: &LifecycleContext,
    device_id: String,
) -> Result<(), StepError> {
    let StepOutcome::Leased(report) = outcome(lifecycle_context)? else {
        return Err(StepError::Assertion(format!(
            "expected a completed lease, got: {:?}",
            lifecycle_context.outcome
        )));
    };
    if report.device.id.as_str() != device_id.trim() {
        return Err(StepError::Assertion(format!(
            "expected device {device_id}, got {}",
            report.device.id
        )));
    }
    if report.state == LifecycleState::Removed {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected removed state, got {}",
            report.state
        )))
    }
}
