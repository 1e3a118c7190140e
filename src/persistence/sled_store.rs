use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use tracing::debug;

use crate::persistence::ListingDirectory;
use crate::protocol::{ListingId, ParticipantId};
use crate::utils::{RelayError, RelayResult};

const LISTINGS_TREE: &str = "listings";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub listing_id: ListingId,
    pub supplier_id: ParticipantId,
    pub registered_at: i64,
}

#[derive(Clone)]
pub struct SledListingDirectory {
    db: Db,
    listings: Tree,
}

impl SledListingDirectory {
    pub fn open(path: &str) -> RelayResult<Self> {
        let db = sled::open(path)?;
        let listings = db.open_tree(LISTINGS_TREE)?;
        Ok(Self { db, listings })
    }

    /// Insert or replace the owner of a listing.
    pub fn register_listing(
        &self,
        listing_id: ListingId,
        supplier_id: ParticipantId,
    ) -> RelayResult<ListingRecord> {
        let record = ListingRecord {
            listing_id,
            supplier_id,
            registered_at: Utc::now().timestamp(),
        };
        let serialized = serde_json::to_vec(&record)?;
        self.listings.insert(listing_id.to_be_bytes(), serialized)?;
        debug!(listing_id, supplier_id, "registered listing");
        Ok(record)
    }

    /// Returns `true` if the listing existed.
    pub fn remove_listing(&self, listing_id: ListingId) -> RelayResult<bool> {
        Ok(self.listings.remove(listing_id.to_be_bytes())?.is_some())
    }

    pub fn get(&self, listing_id: ListingId) -> RelayResult<Option<ListingRecord>> {
        match self.listings.get(listing_id.to_be_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn flush(&self) -> RelayResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ListingDirectory for SledListingDirectory {
    fn resolve(&self, listing_id: ListingId) -> RelayResult<ParticipantId> {
        self.get(listing_id)?
            .map(|record| record.supplier_id)
            .ok_or(RelayError::UnknownListing(listing_id))
    }
}

impl std::fmt::Debug for SledListingDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledListingDirectory")
            .field("db", &"sled::Db")
            .field("listings", &self.listings.len())
            .finish()
    }
}
