pub mod autotrader;
pub mod browser;
pub mod cars_com;
pub mod client;
pub mod craigslist;
pub mod facebook;
pub mod offerup;
pub mod traits;
pub mod types;

pub use autotrader::AutoTraderScraper;
pub use cars_com::CarsComScraper;
pub use craigslist::CraigslistScraper;
pub use facebook::FacebookScraper;
pub use offerup::OfferUpScraper;
pub use traits::ScraperTrait;
pub use types::{SearchParams, SourceToggles};
