pub(crate) mod auth;
pub(crate) mod cart;
pub(crate) mod catalog;
pub(crate) mod general;
pub(crate) mod orders;

use std::sync::Arc;

use anyhow::Result;
use storefront_client::StorefrontClient;
use storefront_sdk::{CartStore, CatalogStore, OrdersStore};

use crate::config::Config;

/// Everything a command needs: the resolved configuration and the shared
/// client. Stores are created on demand so each command only touches the
/// state files it uses.
pub(crate) struct Context {
    pub config: Config,
    pub client: Arc<StorefrontClient>,
}

impl Context {
    pub(crate) fn new(config: Config) -> Result<Self> {
        let client = Arc::new(StorefrontClient::new(config.client_config())?);
        Ok(Context { config, client })
    }

    pub(crate) fn cart_store(&self) -> Result<CartStore> {
        Ok(CartStore::new(
            Arc::clone(&self.client),
            Some(self.config.selection_file()),
        )?)
    }

    pub(crate) fn catalog_store(&self) -> Result<CatalogStore> {
        Ok(CatalogStore::new(
            Arc::clone(&self.client),
            Some(self.config.catalog_file()),
        )?)
    }

    pub(crate) fn orders_store(&self) -> OrdersStore {
        OrdersStore::new(Arc::clone(&self.client))
    }
}
