use crate::models::Listing;
use crate::scrapers::browser::BrowserSession;
use crate::scrapers::client::{clean_price, clean_text, extract_year, find_dollar_amount};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "Facebook Marketplace";

/// Facebook Marketplace scraper.
///
/// Marketplace renders everything client-side and aggressively gates
/// logged-out traffic, so this is the least reliable source and stays
/// disabled by default. One browser session serves all requested makes.
pub struct FacebookScraper;

impl FacebookScraper {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    fn build_url(make: &str, params: &SearchParams) -> String {
        let mut query_text = make.to_string();
        if let Some(model) = &params.model {
            query_text.push(' ');
            query_text.push_str(model);
        }
        if let Some(year_min) = params.year_min {
            query_text.push(' ');
            query_text.push_str(&year_min.to_string());
        }

        let mut url = format!(
            "https://www.facebook.com/marketplace/search/?query={}",
            urlencoding::encode(&query_text)
        );
        if let Some(price_min) = params.price_min {
            url.push_str(&format!("&minPrice={price_min}"));
        }
        if let Some(price_max) = params.price_max {
            url.push_str(&format!("&maxPrice={price_max}"));
        }
        url
    }

    fn parse_results(
        html: &str,
        fallback_location: &str,
        max_results: usize,
        seen: &mut HashSet<String>,
    ) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href*='/marketplace/item/']").unwrap();
        let img_selector = Selector::parse("img").unwrap();

        let mut listings = Vec::new();

        for anchor in document.select(&anchor_selector) {
            if listings.len() >= max_results {
                break;
            }

            let href = anchor.value().attr("href").unwrap_or("");
            let url = if href.starts_with('/') {
                format!("https://www.facebook.com{href}")
            } else {
                href.to_string()
            };
            // Strip tracking junk so the url stays a stable dedup key
            let url = url.split('?').next().unwrap_or(&url).to_string();

            let text = clean_text(&anchor.text().collect::<String>());

            let amount = find_dollar_amount(&text);
            let price = amount
                .as_deref()
                .map(|p| clean_price(p))
                .unwrap_or_else(|| "N/A".to_string());

            let mut title = text.clone();
            if let Some(amount) = &amount {
                title = clean_text(&title.replacen(amount.as_str(), "", 1));
            }
            if title.is_empty() {
                // Some tiles only label the photo
                title = anchor
                    .select(&img_selector)
                    .next()
                    .and_then(|i| i.value().attr("alt"))
                    .map(clean_text)
                    .unwrap_or_default();
            }

            if title.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let image_url = anchor
                .select(&img_selector)
                .next()
                .and_then(|i| i.value().attr("src"))
                .unwrap_or("")
                .to_string();

            listings.push(Listing {
                year: extract_year(&title),
                title,
                price,
                location: fallback_location.to_string(),
                url,
                source: SOURCE_NAME.to_string(),
                description: String::new(),
                mileage: String::new(),
                image_url,
            });
        }

        listings
    }
}

#[async_trait]
impl ScraperTrait for FacebookScraper {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let urls: Vec<String> = params
            .makes
            .iter()
            .map(|make| Self::build_url(make, params))
            .collect();
        let location = params.location.clone();
        let max_results = params.max_results;

        let listings = tokio::task::spawn_blocking(move || -> Result<Vec<Listing>> {
            let session = BrowserSession::launch()?;
            let mut seen = HashSet::new();
            let mut all_listings = Vec::new();

            for url in urls {
                debug!("Fetching {url}");
                let html = session.fetch_html(&url, Duration::from_secs(3))?;
                all_listings.extend(Self::parse_results(&html, &location, max_results, &mut seen));
            }

            Ok(all_listings)
        })
        .await
        .context("Facebook browser task aborted")??;

        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}
