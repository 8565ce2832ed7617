//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STOREDB_*)
//! 2. TOML config file (if STOREDB_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STOREDB_*)
/// 2. TOML config file (if STOREDB_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root URL of the remote catalogue.
    ///
    /// Set via STOREDB_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via STOREDB_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via STOREDB_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Items per derived page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before a typed search term is applied.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `limit` for the bulk inventory listing.
    ///
    /// The inventory view pulls the whole catalogue in one request so that
    /// category filtering can run locally.
    #[serde(default = "default_inventory_limit")]
    pub inventory_limit: u32,

    /// `limit` for by-category listings.
    #[serde(default = "default_category_limit")]
    pub category_limit: u32,

    /// `limit` for search requests.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_base_url() -> String {
    "https://dummyjson.com".into()
}

fn default_user_agent() -> String {
    "storedb/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    20
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_inventory_limit() -> u32 {
    194
}

fn default_category_limit() -> u32 {
    100
}

fn default_search_limit() -> u32 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            inventory_limit: default_inventory_limit(),
            category_limit: default_category_limit(),
            search_limit: default_search_limit(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STOREDB_`
    /// 2. TOML file from `STOREDB_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STOREDB_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(Env::prefixed("STOREDB_").map(|key| key.as_str().to_lowercase().into())))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://dummyjson.com");
        assert_eq!(config.user_agent, "storedb/0.1");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.inventory_limit, 194);
        assert_eq!(config.category_limit, 100);
        assert_eq!(config.search_limit, 100);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = r#"
            base_url = "http://localhost:8080"
            page_size = 10
        "#;
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml));
        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.search_limit, 100);
    }

    #[test]
    fn test_invalid_layer_is_rejected() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("page_size = 0"));
        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "page_size"));
    }

    #[test]
    fn test_malformed_layer_fails_to_load() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("timeout_ms = \"soon\""));
        assert!(matches!(AppConfig::extract(figment), Err(ConfigError::LoadFailed(_))));
    }
}
