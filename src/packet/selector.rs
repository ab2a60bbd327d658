//! First-match selection over catalog listings.
//!
//! The selector scans entries in the order the provider returned them and
//! returns the first one whose predicate holds. There is no scoring: catalogs
//! are small and already scoped to the project.

use serde::de::DeserializeOwned;
use tracing::info;

use super::PacketError;

/// A provider-offered template that can be chosen by a scalar criterion.
pub trait CatalogEntry {
    /// Catalog kind used in diagnostics and errors.
    const KIND: &'static str;
    /// Attribute the criterion is compared against.
    const CRITERION: &'static str;

    /// Provider identifier.
    fn id(&self) -> &str;

    /// Human readable name.
    fn name(&self) -> &str;

    /// Returns whether this entry satisfies `criterion`.
    fn matches(&self, criterion: &str) -> bool;
}

/// A decoded listing response that carries either entries or provider errors.
pub trait CatalogListing: DeserializeOwned {
    /// Entry type carried by the listing.
    type Entry: CatalogEntry;

    /// Provider-side errors, when the payload carries an error list.
    fn errors(&self) -> Option<&[String]>;

    /// Consumes the listing, yielding entries in provider order.
    fn into_entries(self) -> Vec<Self::Entry>;
}

/// Rejects an empty criterion before any network access.
///
/// # Errors
///
/// Returns [`PacketError::InvalidParameter`] when `criterion` is empty.
pub fn require_criterion<E: CatalogEntry>(criterion: &str) -> Result<(), PacketError> {
    if criterion.is_empty() {
        return Err(PacketError::InvalidParameter {
            field: E::CRITERION.to_owned(),
            kind: E::KIND.to_owned(),
        });
    }
    Ok(())
}

/// Returns the first entry matching `criterion`, in listing order.
///
/// # Errors
///
/// Returns [`PacketError::InvalidParameter`] for an empty criterion and
/// [`PacketError::NotFound`] when no entry matches.
pub fn select_entry<E, I>(entries: I, criterion: &str) -> Result<E, PacketError>
where
    E: CatalogEntry,
    I: IntoIterator<Item = E>,
{
    require_criterion::<E>(criterion)?;
    info!(
        kind = E::KIND,
        field = E::CRITERION,
        criterion,
        "searching catalog"
    );

    let found = entries
        .into_iter()
        .find(|entry| entry.matches(criterion))
        .ok_or_else(|| PacketError::NotFound {
            kind: E::KIND.to_owned(),
            criterion: criterion.to_owned(),
        })?;

    info!(
        kind = E::KIND,
        id = found.id(),
        name = found.name(),
        "found catalog entry"
    );
    Ok(found)
}

/// Selects from a decoded listing, surfacing provider errors first.
///
/// # Errors
///
/// Returns [`PacketError::ServerReported`] when the listing carries an error
/// list, otherwise the errors of [`select_entry`].
pub fn select_from_listing<L: CatalogListing>(
    listing: L,
    path: &str,
    criterion: &str,
) -> Result<L::Entry, PacketError> {
    require_criterion::<L::Entry>(criterion)?;
    if let Some(errors) = listing.errors() {
        return Err(PacketError::ServerReported {
            path: path.to_owned(),
            errors: errors.to_vec(),
        });
    }
    select_entry(listing.into_entries(), criterion)
}
