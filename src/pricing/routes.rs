//! Stateless pricing endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::AppState;

use super::calculators;
use super::models::DistanceSnapshot;
use super::providers::DistanceFailure;
use super::requests::{DistanceQuery, QuoteRequest, RecommendedTierQuery};
use super::responses::{DistanceResponse, QuoteResponse, RecommendedTierResponse};
use super::services::PricingError;
use super::tiers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote))
        .route("/recommended-tier", get(recommended_tier))
        .route("/distance", get(distance))
}

/// Quote all tiers for a known distance, without touching any session
async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let vehicle = state.vehicles.resolve(request.category.as_deref());
    let distance = DistanceSnapshot {
        distance_km: request.distance_km,
        distance_text: format!("{} km", request.distance_km),
        duration_text: String::new(),
    };

    let calc = calculators::calculate_price(&state.pricing_config, &vehicle, &distance, request.outskirts);
    Ok(Json(calc.into()))
}

async fn recommended_tier(
    State(state): State<AppState>,
    Query(query): Query<RecommendedTierQuery>,
) -> Json<RecommendedTierResponse> {
    let at = query.at.unwrap_or_else(|| state.clock.now());
    let tier = tiers::get_recommended_tier(&state.pricing_config.time_windows, at);
    Json(RecommendedTierResponse { tier, at })
}

/// Proxy a distance lookup for the form's distance display
async fn distance(
    State(state): State<AppState>,
    Query(query): Query<DistanceQuery>,
) -> Result<Json<DistanceResponse>> {
    let origin = query.origin.trim();
    let destination = query.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(AppError::Pricing(PricingError::IncompleteInput));
    }

    let lookup = tokio::time::timeout(
        state.settings.distance.timeout(),
        state.distance.distance(origin, destination),
    )
    .await
    .unwrap_or(Err(DistanceFailure::Timeout));

    let distance = lookup.map_err(|failure| {
        tracing::warn!(reason = failure.code(), "Distance proxy lookup failed: {}", failure);
        AppError::Pricing(PricingError::Distance(failure))
    })?;

    Ok(Json(DistanceResponse { distance }))
}
