use serde::{Deserialize, Serialize};

/// One candidate vehicle-for-sale found on one marketplace.
///
/// Every field is a string on the wire: prices arrive as "$12,345" or the
/// sentinel "N/A", years as 4-digit strings regex-pulled out of titles.
/// Numeric interpretation only ever happens behind guarded parses in the
/// post-filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub price: String,
    pub location: String,
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub mileage: String,
    #[serde(default)]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_empty_on_deserialize() {
        let json = r#"{
            "title": "2014 Honda Civic",
            "price": "$8,500",
            "location": "Trenton, NJ",
            "url": "https://example.org/listing/1",
            "source": "Craigslist"
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.title, "2014 Honda Civic");
        assert_eq!(listing.year, "");
        assert_eq!(listing.mileage, "");
        assert_eq!(listing.image_url, "");
        assert_eq!(listing.description, "");
    }
}
