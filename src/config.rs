//! Configuration for the skill API and scraper.

use serde::{Deserialize, Serialize};

use crate::skills::DiscountTable;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout for static fetches
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Render pages in headless Chrome instead of fetching raw HTML
    #[serde(default)]
    pub render: bool,
    /// Chrome executable override
    #[serde(default)]
    pub chrome_path: Option<String>,
    /// Selector clicked after load to switch the page's settings toggle
    #[serde(default)]
    pub settings_toggle: Option<String>,
    /// Time to wait for dynamic content after navigation
    #[serde(default = "default_render_wait_ms")]
    pub render_wait_ms: u64,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    #[serde(default = "default_snapshot_ttl_hours")]
    pub snapshot_ttl_hours: i64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_render_wait_ms() -> u64 {
    1500
}

fn default_snapshot_dir() -> String {
    "data/snapshots".to_string()
}

fn default_snapshot_ttl_hours() -> i64 {
    24
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            render: false,
            chrome_path: None,
            settings_toggle: None,
            render_wait_ms: default_render_wait_ms(),
            snapshot_dir: default_snapshot_dir(),
            snapshot_ttl_hours: default_snapshot_ttl_hours(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Discount fractions by upgrade level
    #[serde(default)]
    pub discount: DiscountTable,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (UMA_SERVER__PORT, UMA_SCRAPER__RENDER, etc.)
            .add_source(
                config::Environment::with_prefix("UMA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scraper.timeout_secs, 10);
        assert!(!config.scraper.render);
        assert_eq!(config.discount.max_level(), 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "discount": [0, 0.5]}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.discount.max_level(), 1);
        assert_eq!(config.scraper.snapshot_ttl_hours, 24);
    }
}
