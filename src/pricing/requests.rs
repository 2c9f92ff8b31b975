//! Request DTOs for pricing API endpoints.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Request for a stateless quote
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub category: Option<String>,
    pub distance_km: u32,
    #[serde(default)]
    pub outskirts: bool,
}

/// Query for the recommended tier
#[derive(Debug, Deserialize)]
pub struct RecommendedTierQuery {
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// Query for a distance lookup
#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub origin: String,
    pub destination: String,
}

/// Request to select a tier
#[derive(Debug, Deserialize)]
pub struct SelectTierRequest {
    pub tier: String,
    /// Number or numeric string; anything else leaves the price blank
    #[serde(default)]
    pub manual_value: Option<serde_json::Value>,
}

impl SelectTierRequest {
    /// Manual amount if the client sent something numeric
    pub fn manual_amount(&self) -> Option<Decimal> {
        match self.manual_value.as_ref()? {
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            serde_json::Value::String(s) => parse_amount(s),
            _ => None,
        }
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '₪'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .filter(|amount| *amount >= Decimal::ZERO)
}

/// Request to toggle the outskirts surcharge
#[derive(Debug, Deserialize)]
pub struct OutskirtsRequest {
    pub outskirts: bool,
}
