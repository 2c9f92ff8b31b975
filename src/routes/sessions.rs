//! Form session route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::dispatch::{FormDraft, FormSession};
use crate::error::{AppError, Result};
use crate::pricing::models::{PricingState, Tier};
use crate::pricing::requests::{OutskirtsRequest, SelectTierRequest};
use crate::pricing::responses::{
    CalculationResponse, CalculationStatus, DraftUpdatedResponse, MoneyResponse,
    SessionCreatedResponse, SessionResponse, SubmitResponse,
};
use crate::pricing::PricingError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(show).delete(discard))
        .route("/:id/draft", put(update_draft))
        .route("/:id/calculate", post(calculate))
        .route("/:id/tier", post(select_tier))
        .route("/:id/outskirts", post(set_outskirts))
        .route("/:id/submit", post(submit))
}

async fn find(state: &AppState, id: Uuid) -> Result<Arc<FormSession>> {
    state.sessions.get(&id).await.ok_or(AppError::NotFound)
}

async fn create(State(state): State<AppState>) -> (StatusCode, Json<SessionCreatedResponse>) {
    let session = Arc::new(state.new_session());
    let id = session.id();
    state.sessions.insert(session).await;
    tracing::info!("Form session created: {}", id);
    (StatusCode::CREATED, Json(SessionCreatedResponse { id }))
}

async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionResponse>> {
    let session = find(&state, id).await?;
    Ok(Json(SessionResponse {
        id,
        draft: session.draft().await,
        pricing: session.pricing().state().await,
        recommended_tier: session.recommended_tier(state.clock.as_ref()).await,
        notice: session.take_notice().await,
    }))
}

async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<FormDraft>,
) -> Result<(StatusCode, Json<DraftUpdatedResponse>)> {
    let session = find(&state, id).await?;
    let window = session.update_draft(draft).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(DraftUpdatedResponse {
            recalculation_in_ms: window.map(|w| w.as_millis() as u64),
            pricing: session.pricing().state().await,
        }),
    ))
}

/// Recalculate now. Pricing failures are reported in the body, not as
/// HTTP errors, so the form stays usable.
async fn calculate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalculationResponse>> {
    let session = find(&state, id).await?;
    let (status, reason, message) = match session.calculate_now().await {
        Ok(_) => (CalculationStatus::Calculated, None, None),
        Err(e @ PricingError::IncompleteInput) => {
            (CalculationStatus::Declined, None, Some(e.user_message()))
        }
        Err(PricingError::Distance(failure)) => (
            CalculationStatus::Failed,
            Some(failure.code().to_string()),
            Some(failure.user_message()),
        ),
        Err(PricingError::Superseded) => (CalculationStatus::Superseded, None, None),
        Err(other) => return Err(other.into()),
    };

    Ok(Json(CalculationResponse {
        status,
        reason,
        message,
        pricing: session.pricing().state().await,
    }))
}

async fn select_tier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectTierRequest>,
) -> Result<Json<PricingState>> {
    let session = find(&state, id).await?;
    let tier: Tier = request.tier.parse()?;
    Ok(Json(session.pricing().select_tier(tier, request.manual_amount()).await))
}

async fn set_outskirts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OutskirtsRequest>,
) -> Result<Json<PricingState>> {
    let session = find(&state, id).await?;
    Ok(Json(session.set_outskirts(request.outskirts).await))
}

async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>> {
    let session = find(&state, id).await?;
    let webhook = state
        .webhook
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Submission webhook is not configured".to_string()))?;

    let payload = session.submit(webhook).await?;
    Ok(Json(SubmitResponse {
        submitted: true,
        final_price: MoneyResponse {
            amount: payload.final_price,
        },
        pricing_tier: payload.pricing_tier,
    }))
}

/// Explicit reset: clears the form and forgets the session
async fn discard(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let session = find(&state, id).await?;
    session.reset().await;
    state.sessions.invalidate(&id).await;
    Ok(StatusCode::NO_CONTENT)
}
