use crate::models::Listing;
use crate::scrapers::types::SearchParams;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all marketplace scrapers
/// This allows easy addition of new sources (eBay Motors, CarGurus, etc) in the future
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Run one search against the source and return normalized listings.
    ///
    /// Implementations process the requested makes sequentially to stay
    /// polite toward the target site's rate limits, honor
    /// `params.max_results` as a per-make cap, and never emit two listings
    /// with the same url or a listing with an empty title or url.
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>>;

    /// Get the display name of the scraper source
    fn source_name(&self) -> &'static str;
}
