//! Shared fixtures for lifecycle BDD scenarios.

use std::time::Duration;

use metal_lease::packet::{Event, Facility, OperatingSystem, Plan};
use metal_lease::test_support::ScriptedTransport;
use metal_lease::{
    DeviceId, FacilityPolicy, LifecycleManager, LifecycleSettings, PacketError, PollPolicy,
    ProvisionOrchestrator, ProvisionReport, Selection,
};
use rstest::fixture;
use tokio::runtime::Runtime;

use crate::test_constants::{DEFAULT_DISTRO, DEFAULT_FACILITY_FEATURE, DEFAULT_PLAN_CLASS};

#[derive(Clone, Debug)]
pub enum StepOutcome {
    OperatingSystem(OperatingSystem),
    Facility(Facility),
    Created(DeviceId),
    Provisioned(Event),
    Removed,
    Leased(Box<ProvisionReport>),
    Failure(PacketError),
    LeaseFailure(String),
}

#[derive(Clone, Debug)]
pub struct LifecycleContext {
    pub transport: ScriptedTransport,
    pub project: String,
    pub outcome: Option<StepOutcome>,
}

impl LifecycleContext {
    pub fn manager(&self) -> LifecycleManager<ScriptedTransport> {
        let settings = LifecycleSettings::new(self.project.as_str())
            .with_poll(PollPolicy::every(Duration::from_millis(1)));
        LifecycleManager::new(self.transport.clone(), settings)
    }

    pub fn orchestrator(&self) -> ProvisionOrchestrator<ScriptedTransport> {
        ProvisionOrchestrator::new(self.manager())
    }
}

#[fixture]
pub fn lifecycle_context() -> LifecycleContext {
    LifecycleContext {
        transport: ScriptedTransport::new(),
        project: String::new(),
        outcome: None,
    }
}

pub fn runtime() -> Runtime {
    Runtime::new().unwrap_or_else(|err| panic!("tokio runtime should start: {err}"))
}

pub fn default_selection() -> Selection {
    Selection {
        distro: String::from(DEFAULT_DISTRO),
        plan_class: String::from(DEFAULT_PLAN_CLASS),
        facility_feature: String::from(DEFAULT_FACILITY_FEATURE),
        facility_policy: FacilityPolicy::Required,
    }
}

pub fn ubuntu() -> OperatingSystem {
    OperatingSystem {
        id: String::from("os-ubuntu"),
        slug: String::from("ubuntu_20_04"),
        distro: String::from(DEFAULT_DISTRO),
        provisionable_on: vec![String::from(DEFAULT_PLAN_CLASS)],
        ..OperatingSystem::default()
    }
}

pub fn medium_plan() -> Plan {
    Plan {
        id: String::from("plan-medium"),
        class: String::from(DEFAULT_PLAN_CLASS),
        ..Plan::default()
    }
}
