use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use headless_chrome::{Browser, LaunchOptions};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::Property;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::listing_url;

/// Browser-based fetcher using headless Chrome.
///
/// Listing pages assemble their room table client side, so this is the
/// default transport; the plain-HTTP fetcher only sees the server-rendered
/// shell.
pub struct BrowserFetcher {
    browser: Browser,
    base_url: String,
    guests: u32,
    rooms: u32,
    timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    /// Launch headless Chrome with the configured options
    pub fn new(config: &Config) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            base_url: config.base_url.clone(),
            guests: config.guests,
            rooms: config.rooms,
            timeout: Duration::from_secs(config.browser_timeout_secs),
            settle: Duration::from_secs(config.browser_settle_secs),
        })
    }

    fn fetch_blocking(&self, url: &str) -> Result<String> {
        let tab = self.browser.new_tab()?;
        tab.set_default_timeout(self.timeout);

        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;

        // Room tables render after navigation settles
        thread::sleep(self.settle);

        let html = tab.get_content().context("Failed to read page content")?;

        if let Err(e) = tab.close(false) {
            debug!("Failed to close browser tab: {}", e);
        }

        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(
        &self,
        property: &Property,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<String, FetchError> {
        let url = listing_url(
            &self.base_url,
            property,
            check_in,
            check_out,
            self.guests,
            self.rooms,
        );
        debug!("Opening listing page in browser: {}", url);

        self.fetch_blocking(&url)
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    fn source_name(&self) -> &'static str {
        "headless-chrome"
    }
}
