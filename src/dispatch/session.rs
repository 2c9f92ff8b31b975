//! Form session controller.
//!
//! Owns the draft and the pricing session for one dispatcher's form, and
//! turns draft edits into debounced recalculations.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::debounce::{DebounceSettings, Debouncer};
use crate::error::AppError;
use crate::pricing::models::{PriceCalculation, PricingState, Tier};
use crate::pricing::providers::Clock;
use crate::pricing::services::{PricingError, PricingSession};

use super::form::FormDraft;
use super::submission::{SubmissionPayload, WebhookClient};

pub struct FormSession {
    id: Uuid,
    draft: Arc<Mutex<FormDraft>>,
    pricing: Arc<PricingSession>,
    /// Failure message from the last background recalculation, shown once
    notice: Arc<Mutex<Option<String>>>,
    /// Fires with no payload; the handler prices the draft as it is then
    recalc: Debouncer<()>,
    debounce: DebounceSettings,
}

impl FormSession {
    /// Create a session. Spawns the debounce task, so it must run inside a
    /// Tokio runtime.
    pub fn new(id: Uuid, pricing: PricingSession, debounce: DebounceSettings) -> Self {
        let pricing = Arc::new(pricing);
        let draft = Arc::new(Mutex::new(FormDraft::default()));
        let notice = Arc::new(Mutex::new(None));

        let recalc = {
            let pricing = pricing.clone();
            let draft = draft.clone();
            let notice = notice.clone();
            Debouncer::<()>::spawn(move |()| {
                let pricing = pricing.clone();
                let draft = draft.clone();
                let notice = notice.clone();
                async move {
                    let input = draft.lock().await.pricing_input();
                    let message = match pricing.recalculate(&input).await {
                        Ok(_) | Err(PricingError::IncompleteInput) => None,
                        Err(PricingError::Superseded) => return,
                        Err(e) => Some(e.user_message()),
                    };
                    *notice.lock().await = message;
                }
            })
        };

        Self {
            id,
            draft,
            pricing,
            notice,
            recalc,
            debounce,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pricing(&self) -> &PricingSession {
        &self.pricing
    }

    pub async fn draft(&self) -> FormDraft {
        self.draft.lock().await.clone()
    }

    /// Replace the draft.
    ///
    /// Changes to vehicle or address fields schedule a debounced
    /// recalculation and return its quiet period. An outskirts-only change
    /// is applied right away without a new distance lookup.
    pub async fn update_draft(&self, draft: FormDraft) -> Option<Duration> {
        let (edits, outskirts_changed) = {
            let mut current = self.draft.lock().await;
            let edits = draft.pricing_edits(&current);
            let outskirts_changed = draft.outskirts != current.outskirts;
            *current = draft.clone();
            (edits, outskirts_changed)
        };

        if edits.is_empty() {
            if outskirts_changed {
                self.pricing.set_outskirts(draft.outskirts).await;
            }
            return None;
        }

        let window = edits
            .iter()
            .map(|value| self.debounce.window_for(value))
            .max()
            .unwrap_or_else(|| Duration::from_millis(self.debounce.long_ms));

        debug!(session = %self.id, window_ms = window.as_millis() as u64, "Recalculation scheduled");
        self.recalc.trigger((), window);
        Some(window)
    }

    /// Recalculate immediately, bypassing the debounce window. A success
    /// clears any notice left by an earlier background failure.
    pub async fn calculate_now(&self) -> Result<PriceCalculation, PricingError> {
        self.recalc.cancel();
        let input = self.draft.lock().await.pricing_input();
        let calculation = self.pricing.recalculate(&input).await?;
        *self.notice.lock().await = None;
        Ok(calculation)
    }

    pub async fn set_outskirts(&self, outskirts: bool) -> PricingState {
        self.draft.lock().await.outskirts = outskirts;
        self.pricing.set_outskirts(outskirts).await
    }

    /// Pending notification, cleared once read
    pub async fn take_notice(&self) -> Option<String> {
        self.notice.lock().await.take()
    }

    pub async fn recommended_tier(&self, clock: &dyn Clock) -> Tier {
        let planned = self.draft.lock().await.planned_at;
        self.pricing.recommended_tier(planned, clock).await
    }

    /// Post the form to the webhook and reset the session on success.
    pub async fn submit(&self, webhook: &WebhookClient) -> Result<SubmissionPayload, AppError> {
        let draft = self.draft().await;
        let state = self.pricing.state().await;
        let payload = SubmissionPayload::build(&draft, &state, Utc::now())?;

        webhook.submit(&payload).await?;
        self.reset().await;
        Ok(payload)
    }

    pub async fn reset(&self) {
        self.recalc.cancel();
        *self.draft.lock().await = FormDraft::default();
        *self.notice.lock().await = None;
        self.pricing.reset().await;
        debug!(session = %self.id, "Form session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::form::{AddressInput, VehicleSelection};
    use crate::pricing::models::{DistanceSnapshot, PricingConfig, TierValues};
    use crate::pricing::providers::{ConfigVehicleCatalog, DistanceFailure, DistanceProvider};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 10 km for every pair except destinations containing "nowhere"
    struct TenKm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DistanceProvider for TenKm {
        async fn distance(&self, _: &str, dest: &str) -> Result<DistanceSnapshot, DistanceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if dest.to_lowercase().contains("nowhere") {
                return Err(DistanceFailure::NotFound);
            }
            Ok(DistanceSnapshot {
                distance_km: 10,
                distance_text: "10 km".to_string(),
                duration_text: "12 mins".to_string(),
            })
        }
    }

    fn form_session(distance: Arc<TenKm>) -> FormSession {
        let config = Arc::new(PricingConfig::default());
        let pricing = PricingSession::new(
            config.clone(),
            Arc::new(ConfigVehicleCatalog::new(config)),
            distance,
            Duration::from_secs(5),
        );
        FormSession::new(Uuid::new_v4(), pricing, DebounceSettings::default())
    }

    fn draft(destination: &str) -> FormDraft {
        FormDraft {
            vehicle: VehicleSelection {
                category: Some("private".to_string()),
                ..VehicleSelection::default()
            },
            source: AddressInput {
                text: "Haifa".to_string(),
                physical_address: None,
            },
            destination: AddressInput {
                text: destination.to_string(),
                physical_address: None,
            },
            ..FormDraft::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_triggers_one_lookup() {
        let distance = Arc::new(TenKm { calls: AtomicUsize::new(0) });
        let session = form_session(distance.clone());

        for partial in ["A", "Ac", "Acr", "Acre"] {
            session.update_draft(draft(partial)).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(distance.calls.load(Ordering::SeqCst), 1);
        let state = session.pricing().state().await;
        assert_eq!(state.calculated_prices.regular, dec!(354));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_failure_leaves_notice() {
        let session = form_session(Arc::new(TenKm { calls: AtomicUsize::new(0) }));

        session.update_draft(draft("Acre")).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(session.pricing().state().await.calculated_prices.regular, dec!(354));

        session.update_draft(draft("Nowhere Land")).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(session.pricing().state().await.calculated_prices, TierValues::zero());
        assert!(session.take_notice().await.is_some());
        assert!(session.take_notice().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outskirts_toggle_inside_debounce_window_is_kept() {
        let session = form_session(Arc::new(TenKm { calls: AtomicUsize::new(0) }));
        session.update_draft(draft("Acre")).await;
        session.calculate_now().await.unwrap();

        session.update_draft(draft("Akko")).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        session.set_outskirts(true).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert!(session.draft().await.outskirts);
        let state = session.pricing().state().await;
        assert!(state.outskirts);
        assert_eq!(state.calculated_prices.regular, dec!(443));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_calculation_clears_stale_notice() {
        let session = form_session(Arc::new(TenKm { calls: AtomicUsize::new(0) }));

        session.update_draft(draft("Nowhere Land")).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        session.update_draft(draft("Acre")).await;
        session.calculate_now().await.unwrap();

        assert!(session.take_notice().await.is_none());
    }

    #[tokio::test]
    async fn test_outskirts_only_edit_skips_lookup() {
        let distance = Arc::new(TenKm { calls: AtomicUsize::new(0) });
        let session = form_session(distance.clone());
        session.update_draft(draft("Acre")).await;
        session.calculate_now().await.unwrap();
        let calls = distance.calls.load(Ordering::SeqCst);

        let mut edited = draft("Acre");
        edited.outskirts = true;
        assert!(session.update_draft(edited).await.is_none());

        assert_eq!(distance.calls.load(Ordering::SeqCst), calls);
        assert_eq!(session.pricing().state().await.calculated_prices.regular, dec!(443));
    }

    #[tokio::test]
    async fn test_substantive_edit_uses_long_window() {
        let session = form_session(Arc::new(TenKm { calls: AtomicUsize::new(0) }));
        let window = session.update_draft(draft("Acre")).await;
        assert_eq!(window, Some(Duration::from_millis(1200)));

        let window = session.update_draft(draft("")).await;
        assert_eq!(window, Some(Duration::from_millis(300)));
    }

    #[tokio::test]
    async fn test_reset_clears_draft_and_pricing() {
        let session = form_session(Arc::new(TenKm { calls: AtomicUsize::new(0) }));
        session.update_draft(draft("Acre")).await;
        session.calculate_now().await.unwrap();
        session.pricing().select_tier(Tier::Plus50, None).await;

        session.reset().await;

        assert_eq!(session.draft().await, FormDraft::default());
        assert_eq!(session.pricing().state().await, PricingState::default());
    }
}
