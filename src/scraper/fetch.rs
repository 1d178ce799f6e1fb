//! Static HTML fetch over HTTP.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::retry::{retry, RetryPolicy};

/// Build an HTTP client with the configured user agent and timeout
pub fn client(config: &ScraperConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` and return the body, retrying transient failures
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    retry(&RetryPolicy::fetch(), "fetch", || async {
        let response = client.get(url).send().await?.error_for_status()?;
        response.text().await
    })
    .await
    .with_context(|| format!("Failed to fetch {}", url))
}
