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

const SOURCE_NAME: &str = "OfferUp";

/// OfferUp scraper. The listing grid is rendered entirely client-side, so
/// the search runs through a headless browser session on the blocking pool.
pub struct OfferUpScraper;

impl OfferUpScraper {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    /// Rough ZIP-to-coordinates mapping; OfferUp searches are geographic.
    fn zip_to_lat_lon(zip: &str) -> (f64, f64) {
        if let Ok(zip) = zip.trim().parse::<u32>() {
            return match zip {
                32000..=34999 => (27.9944, -81.7603),
                7000..=8999 => (40.0583, -74.4057),
                10000..=14999 => (40.7128, -74.0060),
                90000..=96999 => (34.0522, -118.2437),
                75000..=79999 => (32.7767, -96.7970),
                60000..=62999 => (41.8781, -87.6298),
                _ => (39.8283, -98.5795),
            };
        }
        (39.8283, -98.5795)
    }

    fn build_url(params: &SearchParams, location: &str) -> String {
        let mut query_text = params.makes.join(" ");
        if let Some(model) = &params.model {
            query_text.push(' ');
            query_text.push_str(model);
        }
        if let Some(year_min) = params.year_min {
            query_text.push(' ');
            query_text.push_str(&year_min.to_string());
        }

        let (lat, lon) = Self::zip_to_lat_lon(location);
        format!(
            "https://offerup.com/explore/s/cars-trucks/{}?distance=25&lat={lat}&lon={lon}&delivery_param=p",
            urlencoding::encode(query_text.trim())
        )
    }

    fn parse_results(html: &str, location: &str, max_results: usize) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href*='/item/detail/']").unwrap();
        let img_selector = Selector::parse("img").unwrap();

        let mut seen = HashSet::new();
        let mut listings = Vec::new();

        for anchor in document.select(&anchor_selector) {
            if listings.len() >= max_results {
                break;
            }

            let href = anchor.value().attr("href").unwrap_or("");
            let url = if href.starts_with('/') {
                format!("https://offerup.com{href}")
            } else {
                href.to_string()
            };

            let text = clean_text(&anchor.text().collect::<String>());

            // Tiles carry the title in the image alt when the text is bare
            let img = anchor.select(&img_selector).next();
            let alt_title = img
                .and_then(|i| i.value().attr("alt"))
                .map(clean_text)
                .unwrap_or_default();

            let amount = find_dollar_amount(&text);
            let price = amount
                .as_deref()
                .map(|p| clean_price(p))
                .unwrap_or_else(|| "N/A".to_string());

            let mut title = if !alt_title.is_empty() { alt_title } else { text.clone() };
            if let Some(amount) = &amount {
                title = clean_text(&title.replacen(amount.as_str(), "", 1));
            }

            if title.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let image_url = img
                .and_then(|i| i.value().attr("src").or_else(|| i.value().attr("data-src")))
                .unwrap_or("")
                .to_string();

            listings.push(Listing {
                year: extract_year(&title),
                title,
                price,
                location: location.to_string(),
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
impl ScraperTrait for OfferUpScraper {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let location = if params.location.trim().is_empty() {
            // Default search area when the caller gave no location
            "33410".to_string()
        } else {
            params.location.clone()
        };

        let url = Self::build_url(params, &location);
        let max_results = params.max_results;

        debug!("Fetching {url}");

        let listings = tokio::task::spawn_blocking(move || -> Result<Vec<Listing>> {
            let session = BrowserSession::launch()?;
            let html = session.fetch_html(&url, Duration::from_secs(5))?;
            Ok(Self::parse_results(&html, &location, max_results))
        })
        .await
        .context("OfferUp browser task aborted")??;

        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_to_lat_lon_maps_known_ranges() {
        assert_eq!(OfferUpScraper::zip_to_lat_lon("33410"), (27.9944, -81.7603));
        assert_eq!(OfferUpScraper::zip_to_lat_lon("10001"), (40.7128, -74.0060));
        // unknown input falls back to the geographic center
        assert_eq!(OfferUpScraper::zip_to_lat_lon("Boston"), (39.8283, -98.5795));
    }

    #[test]
    fn build_url_encodes_the_query() {
        let params = SearchParams {
            makes: vec!["Toyota".to_string()],
            model: Some("Land Cruiser".to_string()),
            ..SearchParams::default()
        };
        let url = OfferUpScraper::build_url(&params, "33410");
        assert!(url.starts_with("https://offerup.com/explore/s/cars-trucks/Toyota%20Land%20Cruiser?"));
        assert!(url.contains("lat=27.9944"));
    }

    #[test]
    fn parse_results_reads_item_tiles() {
        let html = r#"
            <html><body>
            <a href="/item/detail/111"><img alt="2008 Toyota 4Runner" src="https://img.example.org/4r.jpg"><span>$7,900</span></a>
            <a href="/item/detail/111"><img alt="2008 Toyota 4Runner (dup)"></a>
            <a href="/item/detail/222">1999 Miata project $2,500</a>
            </body></html>
        "#;

        let listings = OfferUpScraper::parse_results(html, "33410", 20);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "2008 Toyota 4Runner");
        assert_eq!(listings[0].price, "$7,900");
        assert_eq!(listings[0].year, "2008");
        assert_eq!(listings[0].location, "33410");
        assert_eq!(listings[0].url, "https://offerup.com/item/detail/111");
        assert_eq!(listings[1].title, "1999 Miata project");
        assert_eq!(listings[1].price, "$2,500");
    }
}
