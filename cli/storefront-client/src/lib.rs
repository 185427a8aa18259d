//! HTTP client infrastructure for the storefront REST API.
//!
//! This crate provides:
//! - HTTP client construction with bearer token authentication
//! - transparent access-token refresh with single-flight coordination
//! - a persisted session cell shared by every outbound request
//! - typed endpoints and wire types for the backend contract
//!
//! ## Usage
//!
//! ```ignore
//! use storefront_client::{ClientConfig, StorefrontClient};
//!
//! let config = ClientConfig {
//!     base_url: "https://shop.example.com/api".to_string(),
//!     session_file: Some(session_path),
//!     ..Default::default()
//! };
//!
//! let client = StorefrontClient::new(config)?;
//! client.login("a@b.c", "hunter2").await?;
//! let page = client.products(&Default::default()).await?;
//! ```

mod api;
mod config;
mod error;
mod gateway;
mod refresh;
mod session;
pub mod types;

pub use api::StorefrontClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use session::{Session, SessionError};
