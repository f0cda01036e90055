use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::Property;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::listing_url;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain-HTTP fetcher.
///
/// Cheaper than the browser transport but limited to the server-rendered
/// markup; record extraction then leans on the DOM fallback path.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    guests: u32,
    rooms: u32,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            guests: config.guests,
            rooms: config.rooms,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
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
        debug!("Fetching listing page: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
