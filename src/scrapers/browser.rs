use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Headless Chrome session for marketplaces that only render listings
/// client-side (OfferUp, Facebook Marketplace).
///
/// The underlying client is synchronous, so callers run the whole session
/// on the blocking pool: launch, fetch, drop, all within one scraper call.
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a fresh headless Chrome instance.
    pub fn launch() -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self { browser })
    }

    /// Navigate to `url`, give the page time to settle, and return the
    /// rendered document HTML.
    pub fn fetch_html(&self, url: &str, settle: Duration) -> Result<String> {
        debug!("Opening {url}");
        let tab = self.browser.new_tab()?;

        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;

        // Listing grids populate well after the navigation event
        thread::sleep(settle);

        let html_result = tab.evaluate("document.documentElement.outerHTML", false)?;
        let html = match html_result.value {
            Some(value) => value.as_str().unwrap_or("").to_string(),
            None => {
                warn!("Could not get HTML from page");
                String::new()
            }
        };

        Ok(html)
    }
}
