//! Catalog records offered by the provider: operating systems, plans and
//! facilities, together with the listing envelopes they arrive in.
//!
//! Listings carry either a data array keyed by resource kind or an `errors`
//! array. Missing or `null` fields decode to their defaults so sparse
//! provider payloads still parse.

use serde::{Deserialize, Serialize};

use super::selector::{CatalogEntry, CatalogListing};

/// Operating system image that can be installed on a device.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct OperatingSystem {
    /// Provider identifier.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub id: String,
    /// Slug sent in device creation requests (for example `ubuntu_20_04`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub slug: String,
    /// Human readable name.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub name: String,
    /// Distribution name used for matching (for example `ubuntu`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub distro: String,
    /// Distribution version.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub version: String,
    /// Plans this image can be provisioned on.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub provisionable_on: Vec<String>,
    /// Whether the image carries a licence fee.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub licensed: bool,
}

/// Pricing plan describing the hardware class of a device.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Plan {
    /// Provider identifier, sent in device creation requests.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub id: String,
    /// Short slug.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub slug: String,
    /// Human readable name.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub name: String,
    /// Free-form description.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub description: String,
    /// Product line (for example `baremetal`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub line: String,
    /// Plan class used for matching (for example `c2.medium.x86`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub class: String,
}

/// Data centre where devices can be deployed.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Facility {
    /// Provider identifier, sent in device creation requests.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub id: String,
    /// Human readable name.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub name: String,
    /// Short facility code (for example `ewr1`).
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub code: String,
    /// Feature tags such as `baremetal` or `global_ipv4`.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub features: Vec<String>,
    /// Address ranges announced by the facility.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub ip_ranges: Vec<String>,
}

impl CatalogEntry for OperatingSystem {
    const KIND: &'static str = "operating-system";
    const CRITERION: &'static str = "distro";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &str) -> bool {
        self.distro == criterion && !self.provisionable_on.is_empty()
    }
}

impl CatalogEntry for Plan {
    const KIND: &'static str = "plan";
    const CRITERION: &'static str = "class";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &str) -> bool {
        self.class == criterion
    }
}

impl CatalogEntry for Facility {
    const KIND: &'static str = "facility";
    const CRITERION: &'static str = "feature";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &str) -> bool {
        self.features.iter().any(|feature| feature == criterion)
    }
}

/// Response of `GET /operating-systems`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct OperatingSystemListing {
    /// Operating systems in provider order.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub operating_systems: Vec<OperatingSystem>,
    /// Provider-side errors, when present.
    pub errors: Option<Vec<String>>,
}

/// Response of `GET /projects/{id}/plans`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct PlanListing {
    /// Plans in provider order.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub plans: Vec<Plan>,
    /// Provider-side errors, when present.
    pub errors: Option<Vec<String>>,
}

/// Response of `GET /projects/{id}/facilities`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct FacilityListing {
    /// Facilities in provider order.
    #[serde(deserialize_with = "super::types::null_as_default")]
    pub facilities: Vec<Facility>,
    /// Provider-side errors, when present.
    pub errors: Option<Vec<String>>,
}

impl CatalogListing for OperatingSystemListing {
    type Entry = OperatingSystem;

    fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    fn into_entries(self) -> Vec<Self::Entry> {
        self.operating_systems
    }
}

impl CatalogListing for PlanListing {
    type Entry = Plan;

    fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    fn into_entries(self) -> Vec<Self::Entry> {
        self.plans
    }
}

impl CatalogListing for FacilityListing {
    type Entry = Facility;

    fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    fn into_entries(self) -> Vec<Self::Entry> {
        self.facilities
    }
}
