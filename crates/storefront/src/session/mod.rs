//! Session state: cart, wishlist and compare list.
//!
//! [`SessionStore`] is the single source of truth for the three collections.
//! It is a cheaply cloneable handle; every clone shares the same state, and a
//! write through one clone is visible to all others as soon as the call
//! returns.
//!
//! Every mutation that changes a collection writes that collection to the
//! configured [`SessionStorage`]. A failed write is logged and the in-memory
//! change stands.

mod storage;

pub use storage::{
    FileStorage, MemoryStorage, PersistedCartLine, PersistedSession, SessionStorage,
    StorageError, StorageKey, load_snapshot, storage_from_config,
};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use tracing::{info, instrument, warn};

use solarmart_core::{Price, Product, ProductId};

use crate::api::ApiClient;

/// One distinct product in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Outcome of re-fetching a persisted product at session start.
#[derive(Debug, Clone)]
enum Hydration {
    Found(Product),
    /// The backend no longer knows the ID.
    Gone,
    /// The lookup failed for another reason; the entry is kept as-is.
    Unavailable,
}

#[derive(Debug, Default)]
struct SessionState {
    cart: Vec<CartLine>,
    wishlist: Vec<Product>,
    compare: Vec<Product>,
    /// Persisted entries that could not be re-hydrated. They are written back
    /// unchanged until removed or cleared.
    pending: PersistedSession,
}

impl SessionState {
    fn persisted_cart(&self) -> Vec<PersistedCartLine> {
        self.cart
            .iter()
            .map(|line| PersistedCartLine {
                product_id: line.product.id.clone(),
                quantity: line.quantity,
            })
            .chain(self.pending.cart.iter().cloned())
            .collect()
    }

    fn persisted_ids(products: &[Product], pending: &[ProductId]) -> Vec<ProductId> {
        products
            .iter()
            .map(|p| p.id.clone())
            .chain(pending.iter().cloned())
            .collect()
    }
}

/// Shared handle to one shopper's session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: RwLock<SessionState>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// An empty session backed by `storage`. Nothing is read from storage.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::from_state(storage, SessionState::default())
    }

    fn from_state(storage: Arc<dyn SessionStorage>, state: SessionState) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                state: RwLock::new(state),
                storage,
            }),
        }
    }

    /// Rebuild the session persisted in `storage`.
    ///
    /// Product records are re-fetched so prices and stock are current. IDs the
    /// backend reports as not found are dropped; entries whose lookup fails for
    /// another reason are kept in storage and retried next session.
    #[instrument(skip_all)]
    pub async fn restore(storage: Arc<dyn SessionStorage>, client: &ApiClient) -> Self {
        let snapshot = load_snapshot(storage.as_ref());
        let ids = snapshot.product_ids();

        let results = join_all(ids.iter().map(|id| client.get_product(id))).await;
        let lookup: HashMap<ProductId, Hydration> = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| {
                let hydration = match result {
                    Ok(product) => Hydration::Found(product),
                    Err(e) if e.is_not_found() => {
                        warn!(product_id = %id, "Dropping unknown product from session");
                        Hydration::Gone
                    }
                    Err(e) => {
                        warn!(product_id = %id, error = %e, "Could not refresh session product");
                        Hydration::Unavailable
                    }
                };
                (id, hydration)
            })
            .collect();

        let state = hydrate(snapshot, &lookup);
        info!(
            cart_lines = state.cart.len(),
            wishlist = state.wishlist.len(),
            compare = state.compare.len(),
            "Session restored"
        );
        Self::from_state(storage, state)
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write one collection. Called with the write lock held so concurrent
    /// mutations reach storage in the order they were applied.
    fn persist(&self, state: &SessionState, key: StorageKey) {
        let backend = self.inner.storage.as_ref();
        let result = match key {
            StorageKey::Cart => storage::store_key(backend, key, &state.persisted_cart()),
            StorageKey::Wishlist => storage::store_key(
                backend,
                key,
                &SessionState::persisted_ids(&state.wishlist, &state.pending.wishlist),
            ),
            StorageKey::Compare => storage::store_key(
                backend,
                key,
                &SessionState::persisted_ids(&state.compare, &state.pending.compare),
            ),
        };

        if let Err(e) = result {
            warn!(key = %key, error = %e, "Failed to persist session state");
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// A quantity of 0 changes nothing.
    pub fn add_to_cart(&self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let mut state = self.write();
        if let Some(line) = state.cart.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            // An unresolved persisted line for the same product folds into the new one
            let carried = take_pending_line(&mut state.pending.cart, &product.id);
            state.cart.push(CartLine {
                product: product.clone(),
                quantity: quantity.saturating_add(carried),
            });
        }
        self.persist(&state, StorageKey::Cart);
    }

    /// Set the quantity of an existing line. 0 removes the line; an ID not in
    /// the cart is ignored.
    pub fn update_quantity(&self, id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_from_cart(id);
            return;
        }

        let mut state = self.write();
        let Some(line) = state.cart.iter_mut().find(|l| l.product.id == *id) else {
            return;
        };
        if line.quantity != quantity {
            line.quantity = quantity;
            self.persist(&state, StorageKey::Cart);
        }
    }

    pub fn remove_from_cart(&self, id: &ProductId) {
        let mut state = self.write();
        let before = state.cart.len() + state.pending.cart.len();
        state.cart.retain(|l| l.product.id != *id);
        state.pending.cart.retain(|l| l.product_id != *id);
        if state.cart.len() + state.pending.cart.len() != before {
            self.persist(&state, StorageKey::Cart);
        }
    }

    pub fn clear_cart(&self) {
        let mut state = self.write();
        state.cart.clear();
        state.pending.cart.clear();
        self.persist(&state, StorageKey::Cart);
    }

    /// Snapshot of the cart lines in insertion order.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.read().cart.clone()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn cart_item_count(&self) -> u64 {
        self.read().cart.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.read().cart.len()
    }

    #[must_use]
    pub fn cart_subtotal(&self) -> Price {
        self.read().cart.iter().map(CartLine::line_total).sum()
    }

    // =========================================================================
    // Wishlist & Compare
    // =========================================================================

    /// Add to the wishlist. Returns `false` if it was already there.
    pub fn add_to_wishlist(&self, product: &Product) -> bool {
        self.insert_into(product, StorageKey::Wishlist)
    }

    /// Remove from the wishlist. Returns `false` if it was not there.
    pub fn remove_from_wishlist(&self, id: &ProductId) -> bool {
        self.remove_from(id, StorageKey::Wishlist)
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.read().wishlist.iter().any(|p| p.id == *id)
    }

    pub fn clear_wishlist(&self) {
        self.clear(StorageKey::Wishlist);
    }

    #[must_use]
    pub fn wishlist(&self) -> Vec<Product> {
        self.read().wishlist.clone()
    }

    /// Add to the compare list. Returns `false` if it was already there.
    ///
    /// The store does not cap the list; see [`crate::actions::COMPARE_LIMIT`].
    pub fn add_to_compare(&self, product: &Product) -> bool {
        self.insert_into(product, StorageKey::Compare)
    }

    /// Remove from the compare list. Returns `false` if it was not there.
    pub fn remove_from_compare(&self, id: &ProductId) -> bool {
        self.remove_from(id, StorageKey::Compare)
    }

    #[must_use]
    pub fn is_in_compare(&self, id: &ProductId) -> bool {
        self.read().compare.iter().any(|p| p.id == *id)
    }

    #[must_use]
    pub fn compare_len(&self) -> usize {
        self.read().compare.len()
    }

    pub fn clear_compare(&self) {
        self.clear(StorageKey::Compare);
    }

    #[must_use]
    pub fn compare_list(&self) -> Vec<Product> {
        self.read().compare.clone()
    }

    fn insert_into(&self, product: &Product, key: StorageKey) -> bool {
        let mut state = self.write();
        let SessionState {
            wishlist,
            compare,
            pending,
            ..
        } = &mut *state;
        let (list, pending) = match key {
            StorageKey::Wishlist => (wishlist, &mut pending.wishlist),
            StorageKey::Compare => (compare, &mut pending.compare),
            StorageKey::Cart => return false,
        };
        if list.iter().any(|p| p.id == product.id) {
            return false;
        }
        pending.retain(|id| *id != product.id);
        list.push(product.clone());
        self.persist(&state, key);
        true
    }

    fn remove_from(&self, id: &ProductId, key: StorageKey) -> bool {
        let mut state = self.write();
        let SessionState {
            wishlist,
            compare,
            pending,
            ..
        } = &mut *state;
        let (list, pending) = match key {
            StorageKey::Wishlist => (wishlist, &mut pending.wishlist),
            StorageKey::Compare => (compare, &mut pending.compare),
            StorageKey::Cart => return false,
        };

        let before = list.len();
        list.retain(|p| p.id != *id);
        let removed = list.len() != before;

        let pending_before = pending.len();
        pending.retain(|p| p != id);

        if removed || pending.len() != pending_before {
            self.persist(&state, key);
        }
        removed
    }

    fn clear(&self, key: StorageKey) {
        let mut state = self.write();
        match key {
            StorageKey::Wishlist => {
                state.wishlist.clear();
                state.pending.wishlist.clear();
            }
            StorageKey::Compare => {
                state.compare.clear();
                state.pending.compare.clear();
            }
            StorageKey::Cart => return,
        }
        self.persist(&state, key);
    }
}

/// Remove every pending line for `id`, returning their combined quantity.
fn take_pending_line(pending: &mut Vec<PersistedCartLine>, id: &ProductId) -> u32 {
    let mut carried = 0u32;
    pending.retain(|line| {
        if line.product_id == *id {
            carried = carried.saturating_add(line.quantity);
            false
        } else {
            true
        }
    });
    carried
}

/// Rebuild in-memory state from a persisted snapshot and lookup results.
///
/// Duplicate entries collapse to the first occurrence; cart lines with a
/// quantity of 0 are dropped.
fn hydrate(snapshot: PersistedSession, lookup: &HashMap<ProductId, Hydration>) -> SessionState {
    let mut state = SessionState::default();

    for line in snapshot.cart {
        if line.quantity == 0 || state.cart.iter().any(|l| l.product.id == line.product_id) {
            continue;
        }
        match lookup.get(&line.product_id) {
            Some(Hydration::Found(product)) => state.cart.push(CartLine {
                product: product.clone(),
                quantity: line.quantity,
            }),
            Some(Hydration::Unavailable) => {
                if !state.pending.cart.iter().any(|l| l.product_id == line.product_id) {
                    state.pending.cart.push(line);
                }
            }
            Some(Hydration::Gone) | None => {}
        }
    }

    hydrate_list(
        snapshot.wishlist,
        lookup,
        &mut state.wishlist,
        &mut state.pending.wishlist,
    );
    hydrate_list(
        snapshot.compare,
        lookup,
        &mut state.compare,
        &mut state.pending.compare,
    );

    state
}

fn hydrate_list(
    ids: Vec<ProductId>,
    lookup: &HashMap<ProductId, Hydration>,
    products: &mut Vec<Product>,
    pending: &mut Vec<ProductId>,
) {
    for id in ids {
        if products.iter().any(|p| p.id == id) || pending.contains(&id) {
            continue;
        }
        match lookup.get(&id) {
            Some(Hydration::Found(product)) => products.push(product.clone()),
            Some(Hydration::Unavailable) => pending.push(id),
            Some(Hydration::Gone) | None => {}
        }
    }
}
