//! Post-aggregation range filtering.
//!
//! Listing year and price come from scraped free text, so both are treated
//! as untrusted: a listing is only dropped when a field actually parses and
//! provably falls outside the requested range. Unparseable fields disable
//! that axis of filtering for that record rather than rejecting it.

use crate::models::Listing;

/// Filter listings by year and price, keeping anything not provably out of
/// range. Output preserves input order; applying the same bounds twice
/// changes nothing.
pub fn filter_listings(
    listings: Vec<Listing>,
    year_min: Option<i32>,
    year_max: Option<i32>,
    price_min: Option<i64>,
    price_max: Option<i64>,
) -> Vec<Listing> {
    listings
        .into_iter()
        .filter(|listing| {
            if let Some(year) = parse_year(&listing.year) {
                if year_min.is_some_and(|min| year < min) {
                    return false;
                }
                if year_max.is_some_and(|max| year > max) {
                    return false;
                }
            }

            if let Some(price) = parse_price(&listing.price) {
                if price_min.is_some_and(|min| price < min) {
                    return false;
                }
                if price_max.is_some_and(|max| price > max) {
                    return false;
                }
            }

            true
        })
        .collect()
}

/// Guarded conversion of a scraped year field.
fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// Guarded conversion of a scraped price field; handles "$12,345" and bare
/// digits, rejects "N/A" and anything else non-numeric.
fn parse_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect::<String>()
        .trim()
        .to_string();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(year: &str, price: &str) -> Listing {
        Listing {
            title: "test car".to_string(),
            price: price.to_string(),
            location: "Testville".to_string(),
            url: format!("https://example.org/{year}/{price}"),
            source: "Test".to_string(),
            description: String::new(),
            year: year.to_string(),
            mileage: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn unparseable_fields_always_pass() {
        let listings = vec![listing("", "N/A")];
        let kept = filter_listings(listings, Some(2015), Some(2020), Some(1), Some(2));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn mixed_parseable_and_unparseable_fields() {
        let listings = vec![
            listing("2010", "$5,000"),
            listing("2020", "$50,000"),
            listing("", "N/A"),
            listing("2020", "$5,000"),
        ];

        let kept = filter_listings(listings, Some(2015), None, None, Some(30000));

        // 2010 fails year_min; $50,000 fails price_max; the unparseable
        // listing passes both axes by default.
        let urls: Vec<&str> = kept.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.org//N/A", "https://example.org/2020/$5,000"]
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let listings = vec![listing("2015", "$30,000")];
        let kept = filter_listings(listings, Some(2015), Some(2015), Some(30000), Some(30000));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn no_bounds_keeps_everything() {
        let listings = vec![listing("2010", "$5,000"), listing("", "N/A")];
        let kept = filter_listings(listings.clone(), None, None, None, None);
        assert_eq!(kept, listings);
    }

    #[test]
    fn preserves_input_order() {
        let listings = vec![
            listing("2018", "$9,000"),
            listing("2016", "$7,000"),
            listing("2019", "$11,000"),
        ];
        let kept = filter_listings(listings.clone(), Some(2015), None, None, None);
        assert_eq!(kept, listings);
    }

    #[test]
    fn filtering_twice_equals_filtering_once() {
        let listings = vec![
            listing("2010", "$5,000"),
            listing("2020", "$50,000"),
            listing("", "N/A"),
            listing("2017", "$12,500"),
        ];

        let once = filter_listings(listings, Some(2015), None, None, Some(30000));
        let twice = filter_listings(once.clone(), Some(2015), None, None, Some(30000));
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_digit_prices_parse() {
        let listings = vec![listing("2018", "9000")];
        assert!(filter_listings(listings.clone(), None, None, Some(10000), None).is_empty());
        assert_eq!(filter_listings(listings, None, None, None, Some(10000)).len(), 1);
    }
}
