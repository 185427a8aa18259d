//! Domain stores over the storefront HTTP client.
//!
//! Each store owns one slice of client-visible state and keeps it
//! synchronized with the backend: the cart store reconciles every
//! mutation from the backend's response, the catalog store keeps exactly
//! one in-flight search consistent with the latest filters, and the
//! orders store is a thin read-only view. The UI layer renders from
//! store state and never talks to the backend directly.

pub mod cart;
pub mod catalog;
pub mod orders;

pub use cart::{CartError, CartStore};
pub use catalog::{CatalogError, CatalogStore};
pub use orders::OrdersStore;
