//! Typed endpoints of the storefront REST API.
//!
//! One method per backend endpoint, DTOs in and out. Every call is routed
//! through the [Gateway], so authorization expiry recovery applies
//! uniformly; the public auth endpoints (login, register) skip the
//! recovery pipeline because a 401 there means bad credentials.

use std::sync::Arc;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{response_error, ApiError, MapStockConflictExt};
use crate::gateway::Gateway;
use crate::session::Session;
use crate::types::*;

/// A client for the storefront service.
///
/// This wraps the raw HTTP gateway and handles:
/// - bearer token authentication with transparent refresh
/// - typed request/response bodies
/// - conflict classification on cart and order mutations
#[derive(Debug)]
pub struct StorefrontClient {
    gateway: Gateway,
    session: Arc<Session>,
}

impl StorefrontClient {
    /// Create a new client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let session = match config.session_file {
            Some(ref file) => Session::load(file.clone())?,
            None => Session::ephemeral(None),
        };
        let session = Arc::new(session);
        let gateway = Gateway::new(&config, Arc::clone(&session))?;
        Ok(StorefrontClient { gateway, session })
    }

    /// The session cell shared with the gateway.
    pub fn session(&self) -> &Session {
        &self.session
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Signs in and stores the access token. The backend also sets the
    /// refresh cookie on this response.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .gateway
            .execute_public(
                self.gateway
                    .request(Method::POST, "/auth/login")
                    .json(&body),
            )
            .await?;
        let token: TokenResponse = expect_json(response).await?;
        self.session.set(token.access_token)?;
        debug!("signed in");
        Ok(())
    }

    /// Signs out. The backend call invalidates the refresh credential;
    /// the local session is cleared even if that call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .gateway
            .execute(self.gateway.request(Method::POST, "/auth/logout"))
            .await;
        self.session.clear()?;
        if let Err(err) = result {
            debug!(%err, "logout request failed, session cleared locally");
        }
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let response = self
            .gateway
            .execute_public(
                self.gateway
                    .request(Method::POST, "/auth/register")
                    .json(request),
            )
            .await?;
        expect_json(response).await
    }

    pub async fn me(&self) -> Result<AuthUser, ApiError> {
        let response = self
            .gateway
            .execute(self.gateway.request(Method::GET, "/auth/me"))
            .await?;
        expect_json(response).await
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub async fn categories(&self) -> Result<Vec<CategoryDto>, ApiError> {
        let response = self
            .gateway
            .execute(self.gateway.request(Method::GET, "/categories"))
            .await?;
        expect_json(response).await
    }

    #[instrument(skip_all, fields(page = query.page))]
    pub async fn products(&self, query: &ProductQuery) -> Result<PageResponse<ProductDto>, ApiError> {
        let response = self
            .gateway
            .execute(
                self.gateway
                    .request(Method::GET, "/products")
                    .query(&query.to_params()),
            )
            .await?;
        expect_json(response).await
    }

    // -----------------------------------------------------------------------
    // Cart
    // -----------------------------------------------------------------------

    pub async fn cart(&self) -> Result<CartDto, ApiError> {
        let response = self
            .gateway
            .execute(self.gateway.request(Method::GET, "/cart"))
            .await?;
        expect_json(response).await
    }

    pub async fn add_cart_item(&self, product_id: &str, qty: u32) -> Result<CartDto, ApiError> {
        let body = AddCartItemRequest {
            product_id: product_id.to_string(),
            qty,
        };
        let response = self
            .gateway
            .execute(
                self.gateway
                    .request(Method::POST, "/cart/items")
                    .json(&body),
            )
            .await?;
        expect_json(response).await.map_stock_conflict()
    }

    pub async fn update_cart_item(&self, item_id: &str, qty: u32) -> Result<CartDto, ApiError> {
        let body = UpdateCartItemRequest { qty };
        let response = self
            .gateway
            .execute(
                self.gateway
                    .request(Method::PATCH, &format!("/cart/items/{item_id}"))
                    .json(&body),
            )
            .await?;
        expect_json(response).await.map_stock_conflict()
    }

    pub async fn remove_cart_item(&self, item_id: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .execute(
                self.gateway
                    .request(Method::DELETE, &format!("/cart/items/{item_id}")),
            )
            .await?;
        expect_ok(response).await
    }

    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let response = self
            .gateway
            .execute(self.gateway.request(Method::DELETE, "/cart"))
            .await?;
        expect_ok(response).await
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Places an order for the given cart items.
    #[instrument(skip_all, fields(n_items = item_ids.len()))]
    pub async fn checkout(&self, item_ids: &[String]) -> Result<CheckoutReceipt, ApiError> {
        let body = CheckoutRequest {
            item_ids: item_ids.to_vec(),
        };
        let response = self
            .gateway
            .execute(self.gateway.request(Method::POST, "/orders").json(&body))
            .await?;
        expect_json(response).await.map_stock_conflict()
    }

    pub async fn orders(&self, page: u32, size: u32) -> Result<PageResponse<OrderDto>, ApiError> {
        let response = self
            .gateway
            .execute(
                self.gateway
                    .request(Method::GET, "/orders")
                    .query(&[("page", page.to_string()), ("size", size.to_string())]),
            )
            .await?;
        expect_json(response).await
    }

    pub async fn order(&self, id: &str) -> Result<OrderDto, ApiError> {
        let response = self
            .gateway
            .execute(self.gateway.request(Method::GET, &format!("/orders/{id}")))
            .await?;
        expect_json(response).await
    }
}

async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(response_error(response).await);
    }
    Ok(response.json().await?)
}

async fn expect_ok(response: Response) -> Result<(), ApiError> {
    if !response.status().is_success() {
        return Err(response_error(response).await);
    }
    Ok(())
}
