//! Collaborators the pricing engine consumes: vehicle base prices,
//! driving distances and the clock.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::models::{DistanceSnapshot, PricingConfig, VehicleCategory, VehicleQuote};

/// Resolves a vehicle category to its base price
pub trait VehicleDataProvider: Send + Sync {
    /// Never fails: unknown or missing categories resolve to the fallback.
    fn resolve(&self, category: Option<&str>) -> VehicleQuote;
}

/// Resolves driving distance between two addresses
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn distance(&self, origin: &str, destination: &str)
        -> Result<DistanceSnapshot, DistanceFailure>;
}

/// Source of "now" for tier recommendations
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Why a distance lookup failed.
///
/// Every variant is handled identically by the engine (prices reset to
/// zero); they differ only in the message shown to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistanceFailure {
    #[error("address not found")]
    NotFound,
    #[error("no route between addresses")]
    ZeroResults,
    #[error("distance service quota exceeded")]
    OverQuota,
    #[error("distance service request denied")]
    RequestDenied,
    #[error("distance lookup timed out")]
    Timeout,
    #[error("distance lookup failed: {0}")]
    Unknown(String),
}

impl DistanceFailure {
    /// Map a Distance Matrix status string to a failure
    pub fn from_status(status: &str) -> Self {
        match status {
            "NOT_FOUND" => DistanceFailure::NotFound,
            "ZERO_RESULTS" => DistanceFailure::ZeroResults,
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" | "MAX_ROUTE_LENGTH_EXCEEDED" => {
                DistanceFailure::OverQuota
            }
            "REQUEST_DENIED" => DistanceFailure::RequestDenied,
            other => DistanceFailure::Unknown(other.to_string()),
        }
    }

    /// Message for the transient notification shown in the form
    pub fn user_message(&self) -> String {
        match self {
            DistanceFailure::NotFound => {
                "One of the addresses could not be found. Check the address or enter a manual price.".to_string()
            }
            DistanceFailure::ZeroResults => {
                "No driving route was found between the addresses.".to_string()
            }
            DistanceFailure::OverQuota => {
                "The distance service is over its quota. Try again shortly or enter a manual price.".to_string()
            }
            DistanceFailure::RequestDenied => {
                "The distance service refused the request. Enter a manual price.".to_string()
            }
            DistanceFailure::Timeout => {
                "The distance service did not respond in time.".to_string()
            }
            DistanceFailure::Unknown(_) => {
                "Distance calculation failed. Enter a manual price if the problem persists.".to_string()
            }
        }
    }

    /// Short machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            DistanceFailure::NotFound => "not_found",
            DistanceFailure::ZeroResults => "zero_results",
            DistanceFailure::OverQuota => "over_quota",
            DistanceFailure::RequestDenied => "request_denied",
            DistanceFailure::Timeout => "timeout",
            DistanceFailure::Unknown(_) => "unknown",
        }
    }
}

/// Vehicle provider backed by the configured base-price table
#[derive(Debug, Clone)]
pub struct ConfigVehicleCatalog {
    config: Arc<PricingConfig>,
}

impl ConfigVehicleCatalog {
    pub fn new(config: Arc<PricingConfig>) -> Self {
        Self { config }
    }
}

impl VehicleDataProvider for ConfigVehicleCatalog {
    fn resolve(&self, category: Option<&str>) -> VehicleQuote {
        match category.and_then(VehicleCategory::parse) {
            Some(category) => VehicleQuote {
                category,
                base_price: self.config.base_prices.get(category),
                description: category.label().to_string(),
                resolved: true,
                requested: Some(category.as_str().to_string()),
            },
            None => VehicleQuote {
                category: VehicleCategory::Private,
                base_price: self.config.base_prices.get(VehicleCategory::Private),
                description: self.config.fallback_description.clone(),
                resolved: false,
                requested: category.map(str::to_string),
            },
        }
    }
}

/// Wall clock in the server's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// Distance Matrix wire format (only the fields we read)

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

/// Distance provider speaking the Google Distance Matrix JSON API
#[derive(Debug, Clone)]
pub struct DistanceMatrixClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl DistanceMatrixClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client with its own HTTP connection pool and request timeout
    pub fn with_timeout(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, api_url, api_key))
    }
}

#[async_trait]
impl DistanceProvider for DistanceMatrixClient {
    async fn distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DistanceSnapshot, DistanceFailure> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("units", "metric"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport_failure)?;

        let body: MatrixResponse = response.json().await.map_err(transport_failure)?;
        parse_matrix(body)
    }
}

fn transport_failure(err: reqwest::Error) -> DistanceFailure {
    if err.is_timeout() {
        DistanceFailure::Timeout
    } else {
        DistanceFailure::Unknown(err.to_string())
    }
}

fn parse_matrix(body: MatrixResponse) -> Result<DistanceSnapshot, DistanceFailure> {
    if body.status != "OK" {
        return Err(DistanceFailure::from_status(&body.status));
    }

    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or(DistanceFailure::ZeroResults)?;

    if element.status != "OK" {
        return Err(DistanceFailure::from_status(&element.status));
    }

    let distance = element
        .distance
        .ok_or_else(|| DistanceFailure::Unknown("response missing distance".to_string()))?;
    let duration_text = element.duration.map(|d| d.text).unwrap_or_default();

    Ok(DistanceSnapshot {
        distance_km: meters_to_km(distance.value),
        distance_text: distance.text,
        duration_text,
    })
}

fn meters_to_km(meters: f64) -> u32 {
    (meters.max(0.0) / 1000.0).round() as u32
}
