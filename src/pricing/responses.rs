//! Response DTOs for pricing API endpoints.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::form::FormDraft;

use super::models::{DistanceSnapshot, PriceBreakdown, PriceCalculation, PricingState, Tier, TierValues};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

/// Response for a stateless quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub tier_prices: TierValues,
    pub breakdown: PriceBreakdown,
    pub vehicle_warning: Option<String>,
}

impl From<PriceCalculation> for QuoteResponse {
    fn from(calc: PriceCalculation) -> Self {
        Self {
            tier_prices: calc.tier_prices,
            breakdown: calc.breakdown,
            vehicle_warning: calc.vehicle_warning,
        }
    }
}

/// Response for the recommended tier
#[derive(Debug, Serialize)]
pub struct RecommendedTierResponse {
    pub tier: Tier,
    pub at: NaiveDateTime,
}

/// Response for a distance lookup
#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    #[serde(flatten)]
    pub distance: DistanceSnapshot,
}

/// Response for a newly created form session
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub id: Uuid,
}

/// Full view of a form session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub draft: FormDraft,
    pub pricing: PricingState,
    pub recommended_tier: Tier,
    /// One-shot notification from the last background recalculation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Outcome of an explicit recalculation
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Calculated,
    Declined,
    Failed,
    Superseded,
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub status: CalculationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pricing: PricingState,
}

/// Response after a successful submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submitted: bool,
    pub final_price: MoneyResponse,
    pub pricing_tier: String,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response after replacing a session draft
#[derive(Debug, Serialize)]
pub struct DraftUpdatedResponse {
    /// Quiet period before the background recalculation, if one was scheduled
    pub recalculation_in_ms: Option<u64>,
    pub pricing: PricingState,
}
