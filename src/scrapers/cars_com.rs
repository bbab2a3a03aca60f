use crate::models::Listing;
use crate::scrapers::client::{self, clean_price, clean_text, extract_year};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "Cars.com";
const BASE_URL: &str = "https://www.cars.com/shopping/results/";

/// Cars.com scraper. The search endpoint takes everything as query
/// parameters, so no location normalization is needed beyond pulling a ZIP
/// out of whatever the user typed.
pub struct CarsComScraper {
    client: Client,
}

impl CarsComScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: client::build_client()?,
        })
    }

    fn extract_zip(location: &str) -> Option<String> {
        let re = Regex::new(r"\b\d{5}\b").ok()?;
        re.find(location).map(|m| m.as_str().to_string())
    }

    fn parse_results(html: &str, max_results: usize, seen: &mut HashSet<String>) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let card_selector = Selector::parse("div.vehicle-card").unwrap();
        let title_selector = Selector::parse("h2.title").unwrap();
        let price_selector = Selector::parse("span.primary-price").unwrap();
        let mileage_selector = Selector::parse("div.mileage").unwrap();
        let dealer_selector = Selector::parse("div.dealer-name").unwrap();
        let link_selector = Selector::parse("a[href*='/vehicledetail/']").unwrap();
        let img_selector = Selector::parse("img").unwrap();

        let mut listings = Vec::new();

        for card in document.select(&card_selector) {
            if listings.len() >= max_results {
                break;
            }

            let href = card
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or("");
            let url = if href.starts_with('/') {
                format!("https://www.cars.com{href}")
            } else {
                href.to_string()
            };

            let title = card
                .select(&title_selector)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .unwrap_or_default();

            if title.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let price = card
                .select(&price_selector)
                .next()
                .map(|el| clean_price(&el.text().collect::<String>()))
                .unwrap_or_else(|| "N/A".to_string());

            let mileage = card
                .select(&mileage_selector)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .unwrap_or_default();

            let location = card
                .select(&dealer_selector)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .unwrap_or_else(|| "N/A".to_string());

            let image_url = card
                .select(&img_selector)
                .next()
                .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
                .unwrap_or("")
                .to_string();

            listings.push(Listing {
                year: extract_year(&title),
                title,
                price,
                location,
                url,
                source: SOURCE_NAME.to_string(),
                description: String::new(),
                mileage,
                image_url,
            });
        }

        listings
    }
}

#[async_trait]
impl ScraperTrait for CarsComScraper {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let mut seen = HashSet::new();
        let mut all_listings = Vec::new();

        for make in &params.makes {
            let mut query: Vec<(&str, String)> = vec![
                ("makes[]", make.to_lowercase()),
                (
                    "seller_type",
                    if params.private_sellers_only { "private" } else { "all" }.to_string(),
                ),
                ("sort", "relevance".to_string()),
                ("page_size", params.max_results.min(100).to_string()),
            ];

            if let Some(model) = &params.model {
                query.push(("models[]", format!("{}|{}", make.to_lowercase(), model.to_lowercase())));
            }
            if let Some(year_min) = params.year_min {
                query.push(("year_min", year_min.to_string()));
            }
            if let Some(year_max) = params.year_max {
                query.push(("year_max", year_max.to_string()));
            }
            if let Some(price_min) = params.price_min {
                query.push(("list_price_min", price_min.to_string()));
            }
            if let Some(price_max) = params.price_max {
                query.push(("list_price_max", price_max.to_string()));
            }
            if let Some(zip) = Self::extract_zip(&params.location) {
                query.push(("zip", zip));
            }

            debug!("Fetching {BASE_URL} for make {make}");

            let response = self
                .client
                .get(BASE_URL)
                .query(&query)
                .send()
                .await
                .context("Failed to fetch Cars.com page")?;

            if !response.status().is_success() {
                warn!("Cars.com returned status: {}", response.status());
                anyhow::bail!("Failed to fetch Cars.com page: {}", response.status());
            }

            let html = response.text().await.context("Failed to read response body")?;
            let listings = Self::parse_results(&html, params.max_results, &mut seen);
            debug!("Parsed {} Cars.com listings for {make}", listings.len());
            all_listings.extend(listings);
        }

        Ok(all_listings)
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_zip_finds_five_digit_codes() {
        assert_eq!(CarsComScraper::extract_zip("Fort Myers 33922").as_deref(), Some("33922"));
        assert_eq!(CarsComScraper::extract_zip("Boston"), None);
    }

    #[test]
    fn parse_results_reads_vehicle_cards() {
        let html = r#"
            <html><body>
            <div class="vehicle-card">
                <a href="/vehicledetail/abc123/">details</a>
                <h2 class="title">2019 Subaru Outback Premium</h2>
                <span class="primary-price">$21,490</span>
                <div class="mileage">41,322 mi.</div>
                <div class="dealer-name">Midtown Motors</div>
                <img src="https://img.example.org/outback.jpg">
            </div>
            <div class="vehicle-card">
                <h2 class="title">No link, should be dropped</h2>
            </div>
            </body></html>
        "#;

        let mut seen = HashSet::new();
        let listings = CarsComScraper::parse_results(html, 20, &mut seen);

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.title, "2019 Subaru Outback Premium");
        assert_eq!(listing.price, "$21,490");
        assert_eq!(listing.year, "2019");
        assert_eq!(listing.mileage, "41,322 mi.");
        assert_eq!(listing.location, "Midtown Motors");
        assert_eq!(listing.url, "https://www.cars.com/vehicledetail/abc123/");
        assert_eq!(listing.source, "Cars.com");
    }
}
