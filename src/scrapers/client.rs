use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// Desktop browser user agent; several of the marketplaces serve a
/// degraded or empty page to obvious bot agents.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Build the HTTP client used by the non-browser scrapers.
///
/// The request timeout stays under the coordinator's per-source budget so a
/// single stalled fetch surfaces as an error rather than a task timeout.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw price string to the canonical "$12,345" form.
///
/// Empty input becomes the "N/A" sentinel; input that does not reduce to an
/// integer (e.g. "Call for price") is passed through stripped, and the
/// post-filter will treat it as unparseable.
pub fn clean_price(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect::<String>()
        .trim()
        .to_string();

    if stripped.is_empty() {
        return "N/A".to_string();
    }

    match stripped.parse::<i64>() {
        Ok(value) => format!("${}", group_thousands(value)),
        Err(_) => stripped,
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Pull the first plausible 4-digit model year out of free text.
pub fn extract_year(text: &str) -> String {
    if let Ok(re) = Regex::new(r"\b(19|20)\d{2}\b") {
        if let Some(found) = re.find(text) {
            return found.as_str().to_string();
        }
    }
    String::new()
}

/// First "$1,234"-shaped amount in free text, if any.
pub fn find_dollar_amount(text: &str) -> Option<String> {
    let re = Regex::new(r"\$[\d,]+").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}
