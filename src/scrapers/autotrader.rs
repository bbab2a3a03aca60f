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

const SOURCE_NAME: &str = "AutoTrader";
const BASE_URL: &str = "https://www.autotrader.com/cars-for-sale/all-cars";

/// AutoTrader scraper. Make and model travel as upper-case "codes" in the
/// query string; listing cards are tagged with a data-cmp attribute.
pub struct AutoTraderScraper {
    client: Client,
}

impl AutoTraderScraper {
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
        let card_selector = Selector::parse("div[data-cmp='inventoryListing']").unwrap();
        let title_selector = Selector::parse("h2").unwrap();
        let price_selector = Selector::parse("span[data-cmp='firstPrice']").unwrap();
        let mileage_selector = Selector::parse("div[data-cmp='mileageSpecification']").unwrap();
        let link_selector = Selector::parse("a[href*='/cars-for-sale/vehicle']").unwrap();
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
                format!("https://www.autotrader.com{href}")
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
                location: "N/A".to_string(),
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
impl ScraperTrait for AutoTraderScraper {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let mut seen = HashSet::new();
        let mut all_listings = Vec::new();

        for make in &params.makes {
            let mut query: Vec<(&str, String)> = vec![
                ("makeCodeList", make.to_uppercase()),
                ("numRecords", params.max_results.min(100).to_string()),
                ("sortBy", "relevance".to_string()),
            ];

            if let Some(model) = &params.model {
                query.push(("modelCodeList", model.to_uppercase()));
            }
            if let Some(year_min) = params.year_min {
                query.push(("startYear", year_min.to_string()));
            }
            if let Some(year_max) = params.year_max {
                query.push(("endYear", year_max.to_string()));
            }
            if let Some(price_min) = params.price_min {
                query.push(("minPrice", price_min.to_string()));
            }
            if let Some(price_max) = params.price_max {
                query.push(("maxPrice", price_max.to_string()));
            }
            if params.private_sellers_only {
                query.push(("sellerTypes", "p".to_string()));
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
                .context("Failed to fetch AutoTrader page")?;

            if !response.status().is_success() {
                warn!("AutoTrader returned status: {}", response.status());
                anyhow::bail!("Failed to fetch AutoTrader page: {}", response.status());
            }

            let html = response.text().await.context("Failed to read response body")?;
            let listings = Self::parse_results(&html, params.max_results, &mut seen);
            debug!("Parsed {} AutoTrader listings for {make}", listings.len());
            all_listings.extend(listings);
        }

        Ok(all_listings)
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}
