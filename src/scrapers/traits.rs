use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;
use crate::models::Property;

/// Common trait for all listing-page fetchers
/// This allows swapping the browser and plain-HTTP transports behind one seam
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the full listing page HTML for a property and stay window
    async fn fetch_page(
        &self,
        property: &Property,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<String, FetchError>;

    /// Get the name of the fetcher transport
    fn source_name(&self) -> &'static str;
}
