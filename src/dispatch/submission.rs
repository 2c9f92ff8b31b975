//! Submission of a completed form to the workflow webhook.
//!
//! The webhook expects `application/x-www-form-urlencoded` with a single
//! `data` field holding the JSON payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::pricing::models::{DistanceSnapshot, PriceBreakdown, PricingState};

use super::form::{AddressInput, ContactDetails, FormDraft, VehicleSelection};

/// JSON document posted to the webhook
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(with = "rust_decimal::serde::float")]
    pub final_price: Decimal,
    pub pricing_tier: String,
    pub outskirts: bool,
    pub vehicle: VehicleSelection,
    pub source: AddressInput,
    pub destination: AddressInput,
    pub contact: ContactDetails,
    pub planned_at: Option<NaiveDateTime>,
    pub notes: String,
    pub distance: Option<DistanceSnapshot>,
    pub breakdown: PriceBreakdown,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionPayload {
    /// Build the payload from the draft and the current pricing state.
    ///
    /// Refuses a blank manual price rather than submitting a wrong number.
    pub fn build(
        draft: &FormDraft,
        pricing: &PricingState,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let final_price = pricing.final_price.ok_or_else(|| {
            AppError::Validation("Manual price is blank; enter a numeric price before submitting".to_string())
        })?;

        let pricing_tier = pricing
            .selected_tier
            .map(|tier| tier.as_str().to_string())
            .unwrap_or_else(|| "none".to_string());

        Ok(Self {
            final_price,
            pricing_tier,
            outskirts: pricing.outskirts,
            vehicle: draft.vehicle.clone(),
            source: draft.source.clone(),
            destination: draft.destination.clone(),
            contact: draft.contact.clone(),
            planned_at: draft.planned_at,
            notes: draft.notes.clone(),
            distance: pricing.distance_snapshot.clone(),
            breakdown: pricing.breakdown.clone(),
            submitted_at,
        })
    }

    /// Form fields for the webhook body
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        Ok(vec![("data", serde_json::to_string(self)?)])
    }
}

/// Client for the workflow-automation webhook
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<(), AppError> {
        let fields = payload
            .form_fields()
            .map_err(|e| AppError::Internal(format!("Failed to encode submission: {}", e)))?;

        let response = self
            .http
            .post(&self.url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Webhook returned {}", status)));
        }

        info!(
            final_price = %payload.final_price,
            tier = %payload.pricing_tier,
            "Dispatch form submitted"
        );
        Ok(())
    }
}
