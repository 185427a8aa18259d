//! Wire types for the storefront REST API.
//!
//! Field names follow the backend's camelCase JSON. The cart item shape is
//! the unit-price/qty/subtotal one; totals always come from the backend,
//! they are never recomputed client-side.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of both `/auth/login` and `/auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub categories: Vec<CategoryDto>,
    pub stock: Option<u32>,
}

/// Generic paginated response container, as returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    /// Zero-based page number.
    pub number: u32,
}

impl<T> Default for PageResponse<T> {
    fn default() -> Self {
        PageResponse {
            content: vec![],
            total_elements: 0,
            total_pages: 0,
            size: 0,
            number: 0,
        }
    }
}

/// Filters for the product listing.
///
/// A value of `None` omits the corresponding query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub text: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 12;

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            text: None,
            category_id: None,
            min_price: None,
            max_price: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl ProductQuery {
    /// Renders the query as URL parameter pairs.
    /// `page` and `size` are always sent, the filters only when set.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref text) = self.text {
            params.push(("q", text.clone()));
        }
        if let Some(ref category_id) = self.category_id {
            params.push(("categoryId", category_id.clone()));
        }
        if let Some(min_price) = self.min_price {
            params.push(("minPrice", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("size", self.page_size.to_string()));
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub unit_price: f64,
    pub qty: u32,
    pub line_subtotal: f64,
}

/// The authoritative cart snapshot.
///
/// `total == Σ line_subtotal` and `item_count == Σ qty` hold for every
/// snapshot the backend confirms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub items: Vec<CartItemDto>,
    pub total: f64,
    pub item_count: u32,
}

impl CartDto {
    pub fn empty() -> Self {
        CartDto {
            items: vec![],
            total: 0.0,
            item_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub qty: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub qty: u32,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub id: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: f64,
    pub qty: u32,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub created_at: String,
    pub status: OrderStatus,
    pub total: f64,
    pub items: Vec<OrderItemDto>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn cart_parses_camel_case_wire_format() {
        let cart: CartDto = serde_json::from_value(json!({
            "items": [{
                "id": "i1",
                "productId": "p1",
                "title": "Dune",
                "unitPrice": 10.0,
                "qty": 2,
                "lineSubtotal": 20.0
            }],
            "total": 20.0,
            "itemCount": 2
        }))
        .unwrap();

        assert_eq!(cart.items[0].product_id, "p1");
        assert_eq!(cart.item_count, 2);
    }

    #[test]
    fn product_query_omits_unset_filters() {
        let params = ProductQuery::default().to_params();
        assert_eq!(params, vec![
            ("page", "0".to_string()),
            ("size", "12".to_string())
        ]);
    }

    #[test]
    fn product_query_renders_all_filters() {
        let query = ProductQuery {
            text: Some("dune".to_string()),
            category_id: Some("c1".to_string()),
            min_price: Some(5.0),
            max_price: Some(20.0),
            page: 2,
            page_size: 24,
            sort: Some("price,asc".to_string()),
        };
        let params = query.to_params();
        assert_eq!(params, vec![
            ("q", "dune".to_string()),
            ("categoryId", "c1".to_string()),
            ("minPrice", "5".to_string()),
            ("maxPrice", "20".to_string()),
            ("page", "2".to_string()),
            ("size", "24".to_string()),
            ("sort", "price,asc".to_string()),
        ]);
    }

    #[test]
    fn order_status_uses_screaming_case() {
        let status: OrderStatus = serde_json::from_value(json!("PAID")).unwrap();
        assert_eq!(status, OrderStatus::Paid);
    }
}
