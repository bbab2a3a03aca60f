mod coordinator;
mod filter;
mod models;
mod scrapers;

use clap::Parser;
use coordinator::SearchCoordinator;
use models::Listing;
use scrapers::{SearchParams, SourceToggles};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber;

/// Search used-car listings across multiple marketplaces at once
#[derive(Parser)]
#[command(name = "car-scout")]
struct Cli {
    /// Car makes, comma-separated (e.g. "Toyota,Honda")
    #[arg(long, value_delimiter = ',', required = true)]
    makes: Vec<String>,

    /// Optional model (e.g. "Camry")
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    year_min: Option<i32>,

    #[arg(long)]
    year_max: Option<i32>,

    #[arg(long)]
    price_min: Option<i64>,

    #[arg(long)]
    price_max: Option<i64>,

    /// City name or ZIP code
    #[arg(long, default_value = "")]
    location: String,

    /// Max results per make per site
    #[arg(long, default_value_t = 20)]
    max_results: usize,

    /// Only show listings from private sellers
    #[arg(long)]
    private_sellers_only: bool,

    /// Include Facebook Marketplace (needs Chrome, often gated)
    #[arg(long)]
    enable_facebook: bool,

    /// Include AutoTrader
    #[arg(long)]
    enable_autotrader: bool,

    #[arg(long)]
    no_craigslist: bool,

    #[arg(long)]
    no_cars_com: bool,

    #[arg(long)]
    no_offerup: bool,

    /// Write results to a JSON file
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn into_params(self) -> (SearchParams, Option<PathBuf>) {
        let output = self.output;
        let params = SearchParams {
            makes: self.makes,
            model: self.model,
            year_min: self.year_min,
            year_max: self.year_max,
            price_min: self.price_min,
            price_max: self.price_max,
            location: self.location,
            max_results: self.max_results,
            private_sellers_only: self.private_sellers_only,
            sources: SourceToggles {
                craigslist: !self.no_craigslist,
                cars_com: !self.no_cars_com,
                offerup: !self.no_offerup,
                autotrader: self.enable_autotrader,
                facebook: self.enable_facebook,
            },
        };
        (params, output)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let (params, output) = cli.into_params();

    info!("🚗 Car Scout - searching {} source(s)...", enabled_count(&params.sources));

    let coordinator = SearchCoordinator::new();
    let results = coordinator.search_all(&params).await;

    let all_listings = coordinator.get_all_listings(&results);
    let all_listings = filter::filter_listings(
        all_listings,
        params.year_min,
        params.year_max,
        params.price_min,
        params.price_max,
    );

    print_results(&results, &all_listings);

    if let Some(path) = output {
        let report = json!({
            "summary": results
                .iter()
                .map(|(source, listings)| (source.clone(), listings.len()))
                .collect::<HashMap<String, usize>>(),
            "total": all_listings.len(),
            "listings": all_listings,
        });
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&path, json).await?;
        info!("💾 Saved results to {}", path.display());
    }

    Ok(())
}

fn enabled_count(sources: &SourceToggles) -> usize {
    [
        sources.craigslist,
        sources.cars_com,
        sources.offerup,
        sources.autotrader,
        sources.facebook,
    ]
    .iter()
    .filter(|enabled| **enabled)
    .count()
}

fn print_results(results: &HashMap<String, Vec<Listing>>, all_listings: &[Listing]) {
    println!("\nSummary by source:");
    println!("{}", "-".repeat(50));
    for (source, listings) in results {
        println!("{source:30} {:3} listings found", listings.len());
    }
    println!("{:30} {:3} listings after filtering\n", "Total", all_listings.len());

    for (i, listing) in all_listings.iter().enumerate() {
        println!("{}. {} ({})", i + 1, listing.title, listing.price);
        if !listing.year.is_empty() {
            println!("   Year: {}", listing.year);
        }
        if !listing.mileage.is_empty() {
            println!("   Mileage: {}", listing.mileage);
        }
        println!("   Location: {}", listing.location);
        println!("   Source: {}", listing.source);
        println!("   URL: {}", listing.url);
        println!();
    }

    if all_listings.is_empty() {
        println!("No listings found. Try adjusting your search parameters.");
    }
}
