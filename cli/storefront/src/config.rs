//! Hierarchical configuration: built-in defaults, an optional
//! `storefront.toml` in the user's config directory, and `STOREFRONT_*`
//! environment variables, in increasing precedence.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment, File};
use serde::{Deserialize, Serialize};
use storefront_client::ClientConfig;

/// Name of storefront managed directories (config, data)
const STOREFRONT_DIR_NAME: &str = "storefront";
pub const STOREFRONT_CONFIG_FILE: &str = "storefront.toml";
const ENV_PREFIX: &str = "STOREFRONT";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the storefront API.
    pub api_url: String,
    /// Directory for persistent client state (session, selection,
    /// catalog cache).
    pub data_dir: PathBuf,
    /// Overrides the user agent sent with every request.
    pub user_agent: Option<String>,
    /// How many orders `storefront orders` lists per page by default.
    pub orders_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(STOREFRONT_DIR_NAME);
        Config {
            api_url: "http://localhost:8080/api".to_string(),
            data_dir,
            user_agent: None,
            orders_page_size: storefront_sdk::orders::DEFAULT_ORDERS_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Resolves the configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut builder = HierarchicalConfig::builder();
        if let Some(config_dir) = dirs::config_dir() {
            let config_file = config_dir
                .join(STOREFRONT_DIR_NAME)
                .join(STOREFRONT_CONFIG_FILE);
            builder = builder.add_source(File::from(config_file).required(false));
        }
        let raw = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("could not read configuration")?;
        let config = raw
            .try_deserialize()
            .context("could not parse configuration")?;
        Ok(config)
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn selection_file(&self) -> PathBuf {
        self.data_dir.join("selection.json")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    /// The client configuration derived from this config.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            session_file: Some(self.session_file()),
            extra_headers: Default::default(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_the_default_url() {
        temp_env::with_vars(
            [("STOREFRONT_API_URL", Some("https://shop.example.com/api"))],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.api_url, "https://shop.example.com/api");
            },
        );
    }

    #[test]
    fn state_files_live_under_the_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/storefront-test"),
            ..Default::default()
        };
        assert_eq!(
            config.session_file(),
            PathBuf::from("/tmp/storefront-test/session.json")
        );
        assert_eq!(
            config.catalog_file(),
            PathBuf::from("/tmp/storefront-test/catalog.json")
        );
    }
}
