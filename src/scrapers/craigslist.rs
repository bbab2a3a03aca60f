use crate::models::Listing;
use crate::scrapers::client::{self, clean_price, clean_text, extract_year};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "Craigslist";

/// Craigslist scraper for used cars.
///
/// Craigslist partitions inventory by regional subdomain, so the requested
/// location (city name or ZIP) has to be mapped to a region code before a
/// search URL can be built.
pub struct CraigslistScraper {
    client: Client,
}

impl CraigslistScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: client::build_client()?,
        })
    }

    /// Convert a city name or ZIP code to a Craigslist region code.
    fn normalize_location(location: &str) -> String {
        if location.trim().is_empty() {
            return "sfbay".to_string();
        }

        let lower = location.trim().to_lowercase();
        let compact: String = lower.chars().filter(|c| *c != ' ' && *c != '-').collect();

        // ZIP codes first: map ranges to the nearest major region
        if compact.len() == 5 && compact.chars().all(|c| c.is_ascii_digit()) {
            let zip: u32 = compact.parse().unwrap_or(0);
            return match zip {
                32000..=34999 => "miami",
                7000..=8999 => "newjersey",
                10000..=14999 => "newyork",
                90000..=96999 => "losangeles",
                75000..=79999 => "dallas",
                _ => "sfbay",
            }
            .to_string();
        }

        for (name, code) in LOCATION_MAP {
            if lower == *name {
                return (*code).to_string();
            }
        }

        // Already a region code, or close enough to one
        if !lower.contains(' ') && lower.chars().all(|c| c.is_ascii_alphanumeric()) {
            return lower;
        }

        compact
    }

    fn parse_results(html: &str, region: &str, max_results: usize, seen: &mut HashSet<String>) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let row_selector = Selector::parse("li.cl-search-result").unwrap();
        let anchor_selector = Selector::parse("a.cl-app-anchor").unwrap();
        let price_selector = Selector::parse("span.priceinfo").unwrap();
        let meta_selector = Selector::parse("span.meta").unwrap();
        let img_selector = Selector::parse("img").unwrap();
        let any_anchor = Selector::parse("a").unwrap();

        let mut listings = Vec::new();

        let rows: Vec<_> = document.select(&row_selector).collect();
        let fallback: Vec<_>;
        let rows = if rows.is_empty() {
            // Older markup: no result rows, just posting links scattered in
            // the page. Treat each anchor as its own row.
            fallback = document
                .select(&any_anchor)
                .filter(|a| {
                    a.value()
                        .attr("href")
                        .map(|h| h.contains("/cto/") || h.contains("/ctd/"))
                        .unwrap_or(false)
                })
                .collect();
            &fallback
        } else {
            &rows
        };

        for row in rows {
            if listings.len() >= max_results {
                break;
            }

            let anchor = row
                .select(&anchor_selector)
                .next()
                .or_else(|| {
                    row.select(&any_anchor).find(|a| {
                        a.value()
                            .attr("href")
                            .map(|h| h.contains("/cto/") || h.contains("/ctd/"))
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(*row);

            let href = anchor.value().attr("href").unwrap_or("");
            let url = if let Some(rest) = href.strip_prefix("//") {
                format!("https://{rest}")
            } else if href.starts_with('/') {
                format!("https://{region}.craigslist.org{href}")
            } else {
                href.to_string()
            };

            let title = clean_text(&anchor.text().collect::<String>());
            if title.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let price = row
                .select(&price_selector)
                .next()
                .map(|el| clean_price(&el.text().collect::<String>()))
                .or_else(|| client::find_dollar_amount(&row.text().collect::<String>()).map(|p| clean_price(&p)))
                .unwrap_or_else(|| "N/A".to_string());

            let location = row
                .select(&meta_selector)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .unwrap_or_else(|| "N/A".to_string());

            let image_url = row
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
                mileage: String::new(),
                image_url,
            });
        }

        listings
    }
}

#[async_trait]
impl ScraperTrait for CraigslistScraper {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let region = Self::normalize_location(&params.location);
        // /cto/ is by-owner only, /cta/ mixes in dealers
        let section = if params.private_sellers_only { "cto" } else { "cta" };
        let url = format!("https://{region}.craigslist.org/search/{section}");

        let mut seen = HashSet::new();
        let mut all_listings = Vec::new();

        for make in &params.makes {
            let mut query_text = make.clone();
            if let Some(model) = &params.model {
                query_text.push(' ');
                query_text.push_str(model);
            }
            if let Some(year_min) = params.year_min {
                query_text.push(' ');
                query_text.push_str(&year_min.to_string());
            }

            let mut query: Vec<(&str, String)> =
                vec![("query", query_text), ("sort", "rel".to_string())];
            if let Some(price_min) = params.price_min {
                query.push(("min_price", price_min.to_string()));
            }
            if let Some(price_max) = params.price_max {
                query.push(("max_price", price_max.to_string()));
            }

            debug!("Fetching {url} for make {make}");

            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .context("Failed to fetch Craigslist page")?;

            if !response.status().is_success() {
                warn!("Craigslist returned status: {}", response.status());
                anyhow::bail!("Failed to fetch Craigslist page: {}", response.status());
            }

            let html = response.text().await.context("Failed to read response body")?;
            let listings = Self::parse_results(&html, &region, params.max_results, &mut seen);
            debug!("Parsed {} Craigslist listings for {make}", listings.len());
            all_listings.extend(listings);
        }

        Ok(all_listings)
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}

const LOCATION_MAP: &[(&str, &str)] = &[
    ("new jersey", "newjersey"),
    ("new york", "newyork"),
    ("los angeles", "losangeles"),
    ("san francisco", "sfbay"),
    ("san diego", "sandiego"),
    ("chicago", "chicago"),
    ("houston", "houston"),
    ("phoenix", "phoenix"),
    ("philadelphia", "philadelphia"),
    ("dallas", "dallas"),
    ("austin", "austin"),
    ("seattle", "seattle"),
    ("boston", "boston"),
    ("miami", "miami"),
    ("atlanta", "atlanta"),
    ("denver", "denver"),
    ("detroit", "detroit"),
    ("minneapolis", "minneapolis"),
    ("portland", "portland"),
    ("sacramento", "sacramento"),
];
