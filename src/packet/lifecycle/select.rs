//! Catalog fetch and selection helpers.

use tracing::debug;

use crate::packet::PacketError;
use crate::packet::catalog::{
    Facility, FacilityListing, OperatingSystem, OperatingSystemListing, Plan, PlanListing,
};
use crate::packet::selector::{CatalogListing, require_criterion, select_from_listing};
use crate::transport::Transport;

use super::{LifecycleManager, decode};

impl<T: Transport> LifecycleManager<T> {
    /// Selects the first provisionable operating system whose distro equals
    /// `distro`.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::InvalidParameter`] for an empty distro (before
    /// any request), [`PacketError::Transport`] or [`PacketError::Decoding`]
    /// when the listing cannot be fetched, and the selector errors otherwise.
    pub async fn select_operating_system(
        &self,
        distro: &str,
    ) -> Result<OperatingSystem, PacketError> {
        self.select_from::<OperatingSystemListing>("operating-systems", distro)
            .await
    }

    /// Selects the first project plan whose class equals `class`.
    ///
    /// # Errors
    ///
    /// See [`Self::select_operating_system`].
    pub async fn select_plan(&self, class: &str) -> Result<Plan, PacketError> {
        let path = format!("projects/{}/plans", self.settings.project_id);
        self.select_from::<PlanListing>(&path, class).await
    }

    /// Selects the first project facility advertising `feature`.
    ///
    /// # Errors
    ///
    /// See [`Self::select_operating_system`].
    pub async fn select_facility(&self, feature: &str) -> Result<Facility, PacketError> {
        let path = format!("projects/{}/facilities", self.settings.project_id);
        self.select_from::<FacilityListing>(&path, feature).await
    }

    async fn select_from<L: CatalogListing>(
        &self,
        path: &str,
        criterion: &str,
    ) -> Result<L::Entry, PacketError> {
        require_criterion::<L::Entry>(criterion)?;
        debug!(path, "fetching catalog listing");
        let payload = self.transport.get(path).await?;
        let listing: L = decode(path, &payload)?;
        select_from_listing(listing, path, criterion)
    }
}
