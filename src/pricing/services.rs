//! Pricing service with provider access.
//!
//! `PricingSession` wraps a `PricingEngine` with the vehicle and distance
//! collaborators and drives `compute_total_price` end to end: token,
//! lookup under a timeout, then apply (or discard, when superseded).

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::engine::PricingEngine;
use super::models::{PriceCalculation, PricingConfig, PricingState, Tier};
use super::providers::{Clock, DistanceFailure, DistanceProvider, VehicleDataProvider};
use super::tiers;

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// Source/destination missing: the calculation declined to run
    #[error("Pricing inputs are incomplete")]
    IncompleteInput,

    #[error("Distance lookup failed: {0}")]
    Distance(DistanceFailure),

    /// A newer calculation was issued before this one finished
    #[error("Superseded by a newer calculation")]
    Superseded,

    #[error("Unknown pricing tier '{0}'")]
    UnknownTier(String),

    #[error("Configuration error: {message}")]
    Configuration { message: String, errors: Vec<String> },
}

impl PricingError {
    /// Message suitable for a transient notification in the form
    pub fn user_message(&self) -> String {
        match self {
            PricingError::IncompleteInput => {
                "Enter both addresses to calculate a price.".to_string()
            }
            PricingError::Distance(failure) => failure.user_message(),
            other => other.to_string(),
        }
    }
}

/// Inputs that drive a full recalculation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingInput {
    pub category: Option<String>,
    pub source: String,
    pub destination: String,
    pub outskirts: bool,
}

/// Engine plus collaborators for one form session
pub struct PricingSession {
    engine: Mutex<PricingEngine>,
    vehicles: Arc<dyn VehicleDataProvider>,
    distance: Arc<dyn DistanceProvider>,
    lookup_timeout: Duration,
}

impl PricingSession {
    pub fn new(
        config: Arc<PricingConfig>,
        vehicles: Arc<dyn VehicleDataProvider>,
        distance: Arc<dyn DistanceProvider>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            engine: Mutex::new(PricingEngine::new(config)),
            vehicles,
            distance,
            lookup_timeout,
        }
    }

    /// Calculate all tier prices for the given inputs.
    ///
    /// Failures are reported, never raised: on error the engine state has
    /// already been zeroed (or left alone, for `Superseded`).
    pub async fn compute_total_price(
        &self,
        category: Option<&str>,
        source: &str,
        destination: &str,
        outskirts: bool,
    ) -> Result<PriceCalculation, PricingError> {
        let token = {
            let mut engine = self.engine.lock().await;
            engine.set_outskirts(outskirts);
            engine.begin_request()
        };

        if source.trim().is_empty() || destination.trim().is_empty() {
            debug!(token = token.value(), "Pricing inputs incomplete, skipping calculation");
            return Err(self.engine.lock().await.decline(token));
        }

        let vehicle = self.vehicles.resolve(category);
        if !vehicle.resolved {
            warn!(
                requested = ?vehicle.requested,
                fallback = %vehicle.description,
                "Vehicle category not resolved, using fallback base price"
            );
        }

        let lookup = match tokio::time::timeout(
            self.lookup_timeout,
            self.distance.distance(source.trim(), destination.trim()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DistanceFailure::Timeout),
        };

        if let Err(failure) = &lookup {
            warn!(
                token = token.value(),
                reason = failure.code(),
                "Distance lookup failed: {}",
                failure
            );
        }

        let mut engine = self.engine.lock().await;
        let result = engine.apply_calculation(token, vehicle, lookup);
        if let Ok(calc) = &result {
            info!(
                token = token.value(),
                category = calc.vehicle.category.as_str(),
                distance_km = calc.distance.distance_km,
                outskirts = calc.outskirts,
                regular = %calc.tier_prices.regular,
                "Tier prices recalculated"
            );
        }
        result
    }

    /// Recalculate from a structured input
    pub async fn recalculate(&self, input: &PricingInput) -> Result<PriceCalculation, PricingError> {
        self.compute_total_price(
            input.category.as_deref(),
            &input.source,
            &input.destination,
            input.outskirts,
        )
        .await
    }

    pub async fn select_tier(&self, tier: Tier, manual_value: Option<Decimal>) -> PricingState {
        let mut engine = self.engine.lock().await;
        engine.select_tier(tier, manual_value);
        engine.state().clone()
    }

    pub async fn set_outskirts(&self, outskirts: bool) -> PricingState {
        let mut engine = self.engine.lock().await;
        engine.set_outskirts(outskirts);
        engine.state().clone()
    }

    pub async fn state(&self) -> PricingState {
        self.engine.lock().await.state().clone()
    }

    pub async fn reset(&self) {
        self.engine.lock().await.reset();
    }

    /// Suggested tier for a planned time, or for now when none is planned.
    pub async fn recommended_tier(&self, planned: Option<NaiveDateTime>, clock: &dyn Clock) -> Tier {
        let engine = self.engine.lock().await;
        tiers::recommended_tier_for(&engine.config().time_windows, planned, clock)
    }
}
