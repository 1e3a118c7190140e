//! Listing directory
//!
//! New orders are addressed to the supplier that owns the listing. The
//! relay does not own that mapping, it asks a [`ListingDirectory`]. Two
//! implementations ship with the crate:
//!
//! - [`SledListingDirectory`], an embedded `sled` store maintained through
//!   the `listing` CLI subcommands
//! - `HashMap<ListingId, ParticipantId>`, for embedding and tests

pub mod sled_store;

use std::collections::HashMap;

use crate::protocol::{ListingId, ParticipantId};
use crate::utils::{RelayError, RelayResult};

pub use sled_store::{ListingRecord, SledListingDirectory};

/// Resolves the supplier that owns a listing.
pub trait ListingDirectory: Send + Sync {
    /// Fails with [`RelayError::UnknownListing`] when nobody owns `listing_id`.
    fn resolve(&self, listing_id: ListingId) -> RelayResult<ParticipantId>;
}

impl ListingDirectory for HashMap<ListingId, ParticipantId> {
    fn resolve(&self, listing_id: ListingId) -> RelayResult<ParticipantId> {
        self.get(&listing_id)
            .copied()
            .ok_or(RelayError::UnknownListing(listing_id))
    }
}

#[cfg(test)]
mod tests;
