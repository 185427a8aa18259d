//! The cart synchronization store.
//!
//! The snapshot held here is always the last state the backend confirmed.
//! Every mutation calls the backend first and replaces the snapshot from
//! the response; nothing is recomputed locally except display-only totals
//! over the selected subset. The selection set is client-only state,
//! persisted as an ordered list across restarts.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use storefront_client::types::{CartDto, CheckoutReceipt};
use storefront_client::{ApiError, StorefrontClient};
use storefront_core::state::{read_state_file, write_state_file, StateError};
use storefront_core::Version;
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Raised locally; no backend call is made.
    #[error("no items selected for checkout")]
    EmptySelection,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to persist checkout selection")]
    Persist(#[source] StateError),
}

impl CartError {
    pub fn is_stock_conflict(&self) -> bool {
        matches!(self, CartError::Api(err) if err.is_stock_conflict())
    }
}

/// On-disk form of the selection set. Order is insertion order.
#[derive(Debug, Serialize, Deserialize)]
struct SelectionOnDisk {
    version: Version<1>,
    item_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct CartState {
    /// Last backend-confirmed snapshot. `None` until the first load.
    snapshot: Option<CartDto>,
    /// Item ids marked for checkout. Every id references an item in the
    /// current snapshot.
    selection: IndexSet<String>,
    /// True while a backend mutation is in flight. The UI layer uses this
    /// to debounce duplicate submissions.
    loading: bool,
}

#[derive(Debug)]
pub struct CartStore {
    client: Arc<StorefrontClient>,
    state: Mutex<CartState>,
    selection_file: Option<PathBuf>,
}

impl CartStore {
    /// Creates the store, rehydrating the persisted selection if present.
    pub fn new(
        client: Arc<StorefrontClient>,
        selection_file: Option<PathBuf>,
    ) -> Result<Self, CartError> {
        let mut state = CartState::default();
        if let Some(ref file) = selection_file {
            let (on_disk, _lock) =
                read_state_file::<SelectionOnDisk>(file).map_err(CartError::Persist)?;
            if let Some(on_disk) = on_disk {
                state.selection = on_disk.item_ids.into_iter().collect();
                debug!(n = state.selection.len(), "rehydrated checkout selection");
            }
        }
        Ok(CartStore {
            client,
            state: Mutex::new(state),
            selection_file,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The last backend-confirmed snapshot, if any.
    pub fn snapshot(&self) -> Option<CartDto> {
        self.lock().snapshot.clone()
    }

    /// Selected item ids, in selection order.
    pub fn selection(&self) -> Vec<String> {
        self.lock().selection.iter().cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.lock().selection.len()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn item_count(&self) -> u32 {
        self.lock()
            .snapshot
            .as_ref()
            .map(|cart| cart.item_count)
            .unwrap_or(0)
    }

    /// Display-only subtotal over the selected items. This is the one
    /// place local price math is allowed.
    pub fn selected_subtotal(&self) -> f64 {
        let state = self.lock();
        let Some(ref cart) = state.snapshot else {
            return 0.0;
        };
        cart.items
            .iter()
            .filter(|item| state.selection.contains(&item.id))
            .map(|item| item.line_subtotal)
            .sum()
    }

    // -----------------------------------------------------------------------
    // Backend-synchronized operations
    // -----------------------------------------------------------------------

    /// Fetches the authoritative cart and replaces the snapshot.
    ///
    /// Fails silently (logged) so a transient error leaves the previous
    /// snapshot visible.
    pub async fn load(&self) {
        self.set_loading(true);
        match self.client.cart().await {
            Ok(cart) => self.replace_snapshot(cart),
            Err(err) => warn!(%err, "failed to load cart"),
        }
        self.set_loading(false);
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: &str, qty: u32) -> Result<(), CartError> {
        self.set_loading(true);
        let result = self.client.add_cart_item(product_id, qty).await;
        self.set_loading(false);
        match result {
            Ok(cart) => {
                self.replace_snapshot(cart);
                Ok(())
            },
            // on conflict the snapshot stays whatever the backend last
            // confirmed
            Err(err) => {
                warn!(%err, "failed to add item to cart");
                Err(err.into())
            },
        }
    }

    /// Updates an item's quantity. Quantity zero removes the item.
    ///
    /// On a stock conflict the authoritative cart is re-fetched so any
    /// visual change is undone before the error is raised.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, item_id: &str, qty: u32) -> Result<(), CartError> {
        if qty == 0 {
            return self.remove_item(item_id).await;
        }
        self.set_loading(true);
        let result = self.client.update_cart_item(item_id, qty).await;
        self.set_loading(false);
        match result {
            Ok(cart) => {
                self.replace_snapshot(cart);
                Ok(())
            },
            Err(err) => {
                warn!(%err, "failed to update cart item");
                if err.is_stock_conflict() {
                    self.load().await;
                }
                Err(err.into())
            },
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: &str) -> Result<(), CartError> {
        self.set_loading(true);
        let result = self.client.remove_cart_item(item_id).await;
        self.set_loading(false);
        match result {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.selection.shift_remove(item_id);
                }
                self.persist_selection()?;
                self.load().await;
                Ok(())
            },
            Err(err) => {
                warn!(%err, "failed to remove cart item");
                Err(err.into())
            },
        }
    }

    pub async fn clear(&self) -> Result<(), CartError> {
        self.set_loading(true);
        let result = self.client.clear_cart().await;
        self.set_loading(false);
        match result {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.snapshot = Some(CartDto::empty());
                    state.selection.clear();
                }
                self.persist_selection()?;
                Ok(())
            },
            Err(err) => {
                warn!(%err, "failed to clear cart");
                Err(err.into())
            },
        }
    }

    /// Places an order for the selected items.
    ///
    /// An empty selection fails fast without a backend call. On success
    /// the cart is re-fetched and the selection cleared; on a stock
    /// conflict the cart is re-fetched but the selection is preserved so
    /// the user can retry after adjusting quantities.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CheckoutReceipt, CartError> {
        let selected: Vec<String> = self.selection();
        if selected.is_empty() {
            return Err(CartError::EmptySelection);
        }

        self.set_loading(true);
        let result = self.client.checkout(&selected).await;
        self.set_loading(false);
        match result {
            Ok(receipt) => {
                self.load().await;
                {
                    let mut state = self.lock();
                    state.selection.clear();
                }
                self.persist_selection()?;
                Ok(receipt)
            },
            Err(err) => {
                warn!(%err, "checkout failed");
                if err.is_stock_conflict() {
                    self.load().await;
                }
                Err(err.into())
            },
        }
    }

    // -----------------------------------------------------------------------
    // Selection operations: synchronous, client-only
    // -----------------------------------------------------------------------

    /// Toggles an item in the checkout selection. Ids not present in the
    /// current snapshot are ignored.
    pub fn toggle(&self, item_id: &str) -> Result<(), CartError> {
        {
            let mut state = self.lock();
            let known = state
                .snapshot
                .as_ref()
                .is_some_and(|cart| cart.items.iter().any(|item| item.id == item_id));
            if !known {
                debug!(item_id, "ignoring selection toggle for unknown item");
                return Ok(());
            }
            if !state.selection.shift_remove(item_id) {
                state.selection.insert(item_id.to_string());
            }
        }
        self.persist_selection()
    }

    pub fn select_all(&self) -> Result<(), CartError> {
        {
            let mut state = self.lock();
            let all: IndexSet<String> = state
                .snapshot
                .as_ref()
                .map(|cart| cart.items.iter().map(|item| item.id.clone()).collect())
                .unwrap_or_default();
            state.selection = all;
        }
        self.persist_selection()
    }

    pub fn clear_selection(&self) -> Result<(), CartError> {
        self.lock().selection.clear();
        self.persist_selection()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().expect("cart state lock poisoned")
    }

    fn set_loading(&self, loading: bool) {
        self.lock().loading = loading;
    }

    /// Replaces the snapshot and prunes selection ids whose items are no
    /// longer present.
    fn replace_snapshot(&self, cart: CartDto) {
        let pruned = {
            let mut state = self.lock();
            let before = state.selection.len();
            state
                .selection
                .retain(|id| cart.items.iter().any(|item| &item.id == id));
            let pruned = state.selection.len() != before;
            state.snapshot = Some(cart);
            pruned
        };
        if pruned {
            if let Err(err) = self.persist_selection() {
                warn!(%err, "failed to persist pruned selection");
            }
        }
    }

    fn persist_selection(&self) -> Result<(), CartError> {
        let Some(ref file) = self.selection_file else {
            return Ok(());
        };
        let item_ids = self.selection();
        let (_, lock) = read_state_file::<SelectionOnDisk>(file).map_err(CartError::Persist)?;
        write_state_file(
            &SelectionOnDisk {
                version: Version,
                item_ids,
            },
            file,
            lock,
        )
        .map_err(CartError::Persist)?;
        Ok(())
    }
}
