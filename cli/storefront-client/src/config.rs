//! Configuration types for client construction.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for storefront client construction.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URL for the storefront API.
    pub base_url: String,
    /// Where the session snapshot is persisted across restarts.
    /// `None` keeps the session in memory only (tests, one-shot scripts).
    pub session_file: Option<PathBuf>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Overrides the default user agent.
    pub user_agent: Option<String>,
}
