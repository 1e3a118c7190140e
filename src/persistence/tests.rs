use std::collections::HashMap;

use super::{ListingDirectory, SledListingDirectory};
use crate::utils::RelayError;
use tempfile::tempdir;

fn open_temp() -> (SledListingDirectory, tempfile::TempDir) {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SledListingDirectory::open(dir.path().to_str().unwrap()).unwrap();
    (store, dir)
}

#[test]
fn test_map_directory_resolves() {
    let listings: HashMap<u64, u64> = HashMap::from([(101, 456)]);
    assert_eq!(listings.resolve(101).unwrap(), 456);
    assert!(matches!(
        listings.resolve(102),
        Err(RelayError::UnknownListing(102))
    ));
}

#[test]
fn test_register_and_resolve() {
    let (store, _dir) = open_temp();
    let record = store.register_listing(101, 456).unwrap();
    assert_eq!(record.listing_id, 101);
    assert_eq!(record.supplier_id, 456);

    assert_eq!(store.resolve(101).unwrap(), 456);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_resolve_unknown_listing() {
    let (store, _dir) = open_temp();
    assert!(store.is_empty());
    assert!(matches!(
        store.resolve(101),
        Err(RelayError::UnknownListing(101))
    ));
}

#[test]
fn test_register_replaces_owner() {
    let (store, _dir) = open_temp();
    store.register_listing(101, 456).unwrap();
    store.register_listing(101, 457).unwrap();

    assert_eq!(store.resolve(101).unwrap(), 457);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_listing() {
    let (store, _dir) = open_temp();
    store.register_listing(101, 456).unwrap();

    assert!(store.remove_listing(101).unwrap());
    assert!(!store.remove_listing(101).unwrap());
    assert!(store.get(101).unwrap().is_none());
}

#[test]
fn test_listings_survive_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().to_str().unwrap().to_string();

    {
        let store = SledListingDirectory::open(&path).unwrap();
        store.register_listing(101, 456).unwrap();
        store.flush().unwrap();
    }

    let reopened = SledListingDirectory::open(&path).unwrap();
    assert_eq!(reopened.resolve(101).unwrap(), 456);
}
