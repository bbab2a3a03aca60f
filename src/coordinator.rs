use crate::models::Listing;
use crate::scrapers::{
    AutoTraderScraper, CarsComScraper, CraigslistScraper, FacebookScraper, OfferUpScraper,
    ScraperTrait, SearchParams, SourceToggles,
};
use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Wall-clock budget for a single source, measured from dispatch.
pub const SCRAPER_TIMEOUT: Duration = Duration::from_secs(12);

/// Fans one logical query out to every enabled marketplace scraper in
/// parallel and merges the results keyed by source name.
///
/// One slow or broken source never blocks or fails the others: each scraper
/// runs in its own task under an independent timeout, and a failure is
/// recorded as an empty result for that source only.
pub struct SearchCoordinator;

impl SearchCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Search all enabled marketplaces in parallel.
    ///
    /// Returns one entry per enabled source; sources that time out or fail
    /// map to empty lists. With no usable makes or no enabled sources this
    /// is a no-op returning an empty map.
    pub async fn search_all(&self, params: &SearchParams) -> HashMap<String, Vec<Listing>> {
        let makes: Vec<String> = params
            .makes
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        if makes.is_empty() {
            warn!("No makes supplied, skipping search");
            return HashMap::new();
        }

        let mut params = params.clone();
        params.makes = makes;

        let (scrapers, failed) = Self::build_scrapers(&params.sources);

        if scrapers.is_empty() && failed.is_empty() {
            warn!("No sources enabled, skipping search");
            return HashMap::new();
        }

        let mut results = Self::run_scrapers(scrapers, &params).await;
        // Sources whose setup failed still get a key
        for source in failed {
            results.entry(source.to_string()).or_default();
        }
        results
    }

    /// Flatten a per-source result map into a single list.
    ///
    /// Source order is undefined (the map is unordered); order within one
    /// source is preserved.
    pub fn get_all_listings(&self, results: &HashMap<String, Vec<Listing>>) -> Vec<Listing> {
        let mut all_listings = Vec::new();
        for listings in results.values() {
            all_listings.extend(listings.iter().cloned());
        }
        all_listings
    }

    /// Construct a fresh scraper instance per enabled source.
    ///
    /// Instances are never reused across calls: a scraper may hold per-call
    /// resources (a browser handle), and fresh values keep concurrent
    /// searches from aliasing them. Construction failures are reported
    /// alongside so the caller can still key those sources.
    fn build_scrapers(
        sources: &SourceToggles,
    ) -> (Vec<Box<dyn ScraperTrait>>, Vec<&'static str>) {
        let mut scrapers: Vec<Box<dyn ScraperTrait>> = Vec::new();
        let mut failed = Vec::new();

        let mut add = |built: Result<Box<dyn ScraperTrait>>, name: &'static str| match built {
            Ok(scraper) => scrapers.push(scraper),
            Err(e) => {
                error!("Failed to set up {name} scraper: {e:#}");
                failed.push(name);
            }
        };

        if sources.craigslist {
            add(
                CraigslistScraper::new().map(|s| Box::new(s) as Box<dyn ScraperTrait>),
                "Craigslist",
            );
        }
        if sources.cars_com {
            add(
                CarsComScraper::new().map(|s| Box::new(s) as Box<dyn ScraperTrait>),
                "Cars.com",
            );
        }
        if sources.offerup {
            add(
                OfferUpScraper::new().map(|s| Box::new(s) as Box<dyn ScraperTrait>),
                "OfferUp",
            );
        }
        if sources.autotrader {
            add(
                AutoTraderScraper::new().map(|s| Box::new(s) as Box<dyn ScraperTrait>),
                "AutoTrader",
            );
        }
        if sources.facebook {
            add(
                FacebookScraper::new().map(|s| Box::new(s) as Box<dyn ScraperTrait>),
                "Facebook Marketplace",
            );
        }

        (scrapers, failed)
    }

    /// Run a set of scrapers concurrently and collect results as each one
    /// finishes.
    ///
    /// The result map is pre-seeded with an empty list per scraper, so a
    /// timeout, error, or panic still leaves exactly one entry per source.
    /// On timeout the scraper's future is dropped, cancelling its in-flight
    /// work at the next await point; work already handed to the blocking
    /// pool (a browser session) may linger until it returns on its own.
    async fn run_scrapers(
        scrapers: Vec<Box<dyn ScraperTrait>>,
        params: &SearchParams,
    ) -> HashMap<String, Vec<Listing>> {
        let mut results: HashMap<String, Vec<Listing>> = scrapers
            .iter()
            .map(|s| (s.source_name().to_string(), Vec::new()))
            .collect();

        let mut tasks = JoinSet::new();
        for scraper in scrapers {
            let params = params.clone();
            tasks.spawn(async move {
                let source = scraper.source_name();
                let outcome = tokio::time::timeout(SCRAPER_TIMEOUT, scraper.search(&params)).await;
                (source, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((source, Ok(Ok(listings)))) => {
                    info!("Found {} listings on {source}", listings.len());
                    results.insert(source.to_string(), listings);
                }
                Ok((source, Ok(Err(e)))) => {
                    error!("Error searching {source}: {e:#}");
                }
                Ok((source, Err(_))) => {
                    warn!(
                        "{source} timed out after {}s, discarding",
                        SCRAPER_TIMEOUT.as_secs()
                    );
                }
                Err(e) => {
                    error!("Scraper task panicked: {e}");
                }
            }
        }

        results
    }
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::time::Instant;

    /// Scripted scraper standing in for a real marketplace.
    struct MockScraper {
        name: &'static str,
        behavior: MockBehavior,
    }

    enum MockBehavior {
        Return(Vec<Listing>),
        Fail,
        Hang(Duration),
    }

    impl MockScraper {
        fn returning(name: &'static str, listings: Vec<Listing>) -> Box<dyn ScraperTrait> {
            Box::new(Self {
                name,
                behavior: MockBehavior::Return(listings),
            })
        }

        fn failing(name: &'static str) -> Box<dyn ScraperTrait> {
            Box::new(Self {
                name,
                behavior: MockBehavior::Fail,
            })
        }

        fn hanging(name: &'static str, for_duration: Duration) -> Box<dyn ScraperTrait> {
            Box::new(Self {
                name,
                behavior: MockBehavior::Hang(for_duration),
            })
        }
    }

    #[async_trait]
    impl ScraperTrait for MockScraper {
        async fn search(&self, _params: &SearchParams) -> Result<Vec<Listing>> {
            match &self.behavior {
                MockBehavior::Return(listings) => Ok(listings.clone()),
                MockBehavior::Fail => Err(anyhow!("connection reset by peer")),
                MockBehavior::Hang(for_duration) => {
                    tokio::time::sleep(*for_duration).await;
                    Ok(Vec::new())
                }
            }
        }

        fn source_name(&self) -> &'static str {
            self.name
        }
    }

    fn listing(source: &str, url: &str) -> Listing {
        Listing {
            title: format!("2015 Test Car {url}"),
            price: "$10,000".to_string(),
            location: "Testville".to_string(),
            url: url.to_string(),
            source: source.to_string(),
            description: String::new(),
            year: "2015".to_string(),
            mileage: String::new(),
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn empty_makes_is_a_no_op() {
        let coordinator = SearchCoordinator::new();
        let params = SearchParams {
            makes: vec![],
            ..SearchParams::default()
        };
        assert!(coordinator.search_all(&params).await.is_empty());
    }

    #[tokio::test]
    async fn all_blank_makes_is_a_no_op() {
        let coordinator = SearchCoordinator::new();
        let params = SearchParams {
            makes: vec!["   ".to_string(), "".to_string()],
            ..SearchParams::default()
        };
        assert!(coordinator.search_all(&params).await.is_empty());
    }

    #[tokio::test]
    async fn no_enabled_sources_is_a_no_op() {
        let coordinator = SearchCoordinator::new();
        let params = SearchParams {
            makes: vec!["Toyota".to_string()],
            sources: SourceToggles::none(),
            ..SearchParams::default()
        };
        assert!(coordinator.search_all(&params).await.is_empty());
    }

    #[tokio::test]
    async fn one_failing_scraper_does_not_affect_siblings() {
        let scrapers = vec![
            MockScraper::returning("Alpha", vec![listing("Alpha", "https://a.example/1")]),
            MockScraper::failing("Broken"),
            MockScraper::returning("Beta", vec![listing("Beta", "https://b.example/1")]),
        ];

        let results =
            SearchCoordinator::run_scrapers(scrapers, &SearchParams::default()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["Alpha"].len(), 1);
        assert_eq!(results["Beta"].len(), 1);
        assert!(results["Broken"].is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_scraper_times_out_without_delaying_siblings() {
        let scrapers = vec![
            MockScraper::hanging("Stuck", Duration::from_secs(600)),
            MockScraper::returning("Fast", vec![listing("Fast", "https://f.example/1")]),
        ];

        let started = Instant::now();
        let results =
            SearchCoordinator::run_scrapers(scrapers, &SearchParams::default()).await;

        // Paused clock: total virtual time is bounded by the timeout, not
        // by the 600s the stuck scraper wanted.
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(results.len(), 2);
        assert!(results["Stuck"].is_empty());
        assert_eq!(results["Fast"].len(), 1);
    }

    #[tokio::test]
    async fn every_scraper_gets_exactly_one_entry() {
        let scrapers = vec![
            MockScraper::returning("One", vec![]),
            MockScraper::failing("Two"),
            MockScraper::returning("Three", vec![listing("Three", "https://t.example/1")]),
        ];

        let results =
            SearchCoordinator::run_scrapers(scrapers, &SearchParams::default()).await;

        let mut sources: Vec<_> = results.keys().cloned().collect();
        sources.sort();
        assert_eq!(sources, vec!["One", "Three", "Two"]);
    }

    #[tokio::test]
    async fn get_all_listings_preserves_intra_source_order() {
        let coordinator = SearchCoordinator::new();
        let mut results = HashMap::new();
        results.insert(
            "A".to_string(),
            vec![listing("A", "https://a.example/1"), listing("A", "https://a.example/2")],
        );
        results.insert("B".to_string(), vec![listing("B", "https://b.example/1")]);

        let flat = coordinator.get_all_listings(&results);

        assert_eq!(flat.len(), 3);
        let a1 = flat.iter().position(|l| l.url == "https://a.example/1").unwrap();
        let a2 = flat.iter().position(|l| l.url == "https://a.example/2").unwrap();
        assert!(a1 < a2);
        assert!(flat.iter().any(|l| l.url == "https://b.example/1"));
    }
}
