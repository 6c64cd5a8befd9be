//! Integration tests for session persistence and restore.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use solarmart_core::{Price, ProductId};
use solarmart_integration_tests::{MockBackend, sample_products};
use solarmart_storefront::api::ApiClient;
use solarmart_storefront::session::{
    FileStorage, SessionStorage, SessionStore, StorageKey, load_snapshot,
};
use tempfile::tempdir;

fn product(id: &str) -> solarmart_core::Product {
    sample_products()
        .into_iter()
        .find(|p| p.id.as_str() == id)
        .unwrap()
}

#[tokio::test]
async fn test_restore_round_trips_through_files() {
    let backend = MockBackend::start(sample_products()).await;
    let client = ApiClient::new(&backend.config()).unwrap();
    let dir = tempdir().unwrap();
    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());

    {
        let store = SessionStore::new(storage.clone());
        store.add_to_cart(&product("h1"), 2);
        store.add_to_cart(&product("h1"), 1);
        store.add_to_cart(&product("c2"), 1);
        store.add_to_wishlist(&product("h2"));
        store.add_to_compare(&product("c1"));
        store.add_to_compare(&product("h1"));
    }

    let restored = SessionStore::restore(storage, &client).await;
    assert_eq!(restored.line_count(), 2);
    assert_eq!(restored.cart_item_count(), 4);
    assert_eq!(
        restored.cart_subtotal(),
        Price::from_rupees(150_000 * 3 + 450_000)
    );
    assert!(restored.is_in_wishlist(&ProductId::new("h2")));
    let compare: Vec<String> = restored
        .compare_list()
        .into_iter()
        .map(|p| p.id.into_inner())
        .collect();
    assert_eq!(compare, ["c1", "h1"]);
}

#[tokio::test]
async fn test_restore_drops_unknown_ids() {
    let backend = MockBackend::start(sample_products()).await;
    let client = ApiClient::new(&backend.config()).unwrap();
    let dir = tempdir().unwrap();
    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());

    let store = SessionStore::new(storage.clone());
    store.add_to_cart(&product("h1"), 1);
    store.add_to_wishlist(&product("h2"));
    backend.remove_product(&ProductId::new("h2"));

    let restored = SessionStore::restore(storage.clone(), &client).await;
    assert!(!restored.is_in_wishlist(&ProductId::new("h2")));
    assert_eq!(restored.line_count(), 1);

    // Dropped on the next write
    restored.add_to_wishlist(&product("c1"));
    assert_eq!(
        load_snapshot(&*storage).wishlist,
        vec![ProductId::new("c1")]
    );
}

#[tokio::test]
async fn test_restore_keeps_entries_that_fail_to_load() {
    let backend = MockBackend::start(sample_products()).await;
    let client = ApiClient::new(&backend.config()).unwrap();
    let dir = tempdir().unwrap();
    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());

    let store = SessionStore::new(storage.clone());
    store.add_to_cart(&product("h1"), 1);
    store.add_to_cart(&product("c1"), 3);
    backend.fail_product(&ProductId::new("c1"));

    let restored = SessionStore::restore(storage.clone(), &client).await;
    assert_eq!(restored.line_count(), 1);

    // A later write keeps the unresolved line in storage
    restored.update_quantity(&ProductId::new("h1"), 2);
    let cart = load_snapshot(&*storage).cart;
    assert_eq!(cart.len(), 2);
    assert!(
        cart.iter()
            .any(|l| l.product_id == ProductId::new("c1") && l.quantity == 3)
    );
}

#[tokio::test]
async fn test_malformed_cart_file_does_not_block_other_keys() {
    let backend = MockBackend::start(sample_products()).await;
    let client = ApiClient::new(&backend.config()).unwrap();
    let dir = tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());

    storage.store(StorageKey::Cart, "[{\"productId\":").unwrap();
    storage.store(StorageKey::Wishlist, r#"["h1"]"#).unwrap();

    let restored = SessionStore::restore(storage, &client).await;
    assert_eq!(restored.line_count(), 0);
    assert!(restored.is_in_wishlist(&ProductId::new("h1")));
}
