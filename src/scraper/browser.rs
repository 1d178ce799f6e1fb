//! Page rendering in headless Chrome via chromiumoxide.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ScraperConfig;

fn default_chrome_path() -> &'static str {
    if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
    } else if cfg!(target_os = "windows") {
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
    } else {
        "google-chrome"
    }
}

/// Headless browser producing final HTML for dynamic pages
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
    settings_toggle: Option<String>,
    wait: Duration,
}

impl Browser {
    /// Launch a headless Chrome configured from `config`
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let chrome_path = config
            .chrome_path
            .clone()
            .unwrap_or_else(|| default_chrome_path().to_string());

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", config.user_agent))
            .window_size(1920, 1080)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = ChromeBrowser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        // Handler must keep running for the browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handle,
            settings_toggle: config.settings_toggle.clone(),
            wait: Duration::from_millis(config.render_wait_ms),
        })
    }

    /// Navigate to `url` and return the rendered HTML
    pub async fn render(&self, url: &str) -> Result<String> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;

        let html = self.render_page(&page).await;
        let _ = page.close().await;
        html
    }

    async fn render_page(&self, page: &Page) -> Result<String> {
        page.wait_for_navigation()
            .await
            .context("Navigation did not complete")?;

        if let Some(selector) = &self.settings_toggle {
            match page.find_element(selector.as_str()).await {
                Ok(toggle) => {
                    toggle
                        .click()
                        .await
                        .with_context(|| format!("Failed to click {}", selector))?;
                    debug!("clicked settings toggle {}", selector);
                }
                Err(e) => warn!("settings toggle {} not found: {}", selector, e),
            }
        }

        // Give client-side rendering time to fill the effect table
        tokio::time::sleep(self.wait).await;

        page.content().await.context("Failed to get page content")
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        let _ = self.browser.close().await;
        self.handle.abort();
        Ok(())
    }
}
