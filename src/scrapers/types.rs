use serde::{Deserialize, Serialize};

/// Search parameters shared by every marketplace scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Car makes to search for (e.g. ["Toyota", "Honda"])
    pub makes: Vec<String>,
    /// Optional model to narrow the query (e.g. "Camry")
    pub model: Option<String>,
    /// Minimum model year
    pub year_min: Option<i32>,
    /// Maximum model year
    pub year_max: Option<i32>,
    /// Minimum price (USD)
    pub price_min: Option<i64>,
    /// Maximum price (USD)
    pub price_max: Option<i64>,
    /// City name or ZIP code; scrapers decide how to interpret an empty one
    pub location: String,
    /// Per-make cap on results from a single source
    pub max_results: usize,
    /// Restrict to by-owner listings where the source supports it
    pub private_sellers_only: bool,
    /// Which marketplaces to query
    pub sources: SourceToggles,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            makes: Vec::new(),
            model: None,
            year_min: None,
            year_max: None,
            price_min: None,
            price_max: None,
            location: String::new(),
            max_results: 20,
            private_sellers_only: false,
            sources: SourceToggles::default(),
        }
    }
}

/// Per-marketplace enable flags.
///
/// Defaults mirror which sources have proven reliable: AutoTrader and
/// Facebook Marketplace stay off unless asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceToggles {
    pub craigslist: bool,
    pub cars_com: bool,
    pub offerup: bool,
    pub autotrader: bool,
    pub facebook: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            craigslist: true,
            cars_com: true,
            offerup: true,
            autotrader: false,
            facebook: false,
        }
    }
}

impl SourceToggles {
    /// All marketplaces disabled; useful as a base for picking one or two.
    pub fn none() -> Self {
        Self {
            craigslist: false,
            cars_com: false,
            offerup: false,
            autotrader: false,
            facebook: false,
        }
    }
}
