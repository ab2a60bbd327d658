//! BDD scenarios for the Packet device lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LifecycleContext, lifecycle_context};

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Select an operating system by distribution"
)]
fn scenario_select_operating_system(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Abort when no facility offers the feature"
)]
fn scenario_abort_without_facility(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Create a device in any facility"
)]
fn scenario_create_in_any_facility(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Wait through transient event errors"
)]
fn scenario_wait_through_transient_errors(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Confirm removal of a deleted device"
)]
fn scenario_confirm_removal(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Report a device that survives deletion"
)]
fn scenario_report_surviving_device(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Lease a device end to end"
)]
fn scenario_full_lease(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}
