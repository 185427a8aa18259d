//! Read-only order history.

use std::sync::Arc;

use storefront_client::types::{OrderDto, PageResponse};
use storefront_client::{ApiError, StorefrontClient};
use tracing::warn;

pub const DEFAULT_ORDERS_PAGE_SIZE: u32 = 10;

#[derive(Debug)]
pub struct OrdersStore {
    client: Arc<StorefrontClient>,
}

impl OrdersStore {
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        OrdersStore { client }
    }

    pub async fn list(&self, page: u32, size: u32) -> Result<PageResponse<OrderDto>, ApiError> {
        self.client.orders(page, size).await.inspect_err(|err| {
            warn!(%err, "failed to list orders");
        })
    }

    pub async fn get(&self, id: &str) -> Result<OrderDto, ApiError> {
        self.client.order(id).await.inspect_err(|err| {
            warn!(%err, "failed to fetch order");
        })
    }
}
