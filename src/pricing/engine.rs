//! Pricing engine: owns the pricing state of one form session.
//!
//! The engine is synchronous. Provider I/O happens outside of it (see
//! `services::PricingSession`); results are handed back with the
//! `RequestToken` they were issued under so stale lookups can be dropped.

use rust_decimal::Decimal;
use std::sync::Arc;

use super::calculators::{self, TierView};
use super::models::{
    DistanceSnapshot, PriceBreakdown, PriceCalculation, PricingConfig, PricingState, Tier,
    TierValues, VehicleQuote,
};
use super::providers::DistanceFailure;
use super::services::PricingError;

/// Identifies one calculation request. Later requests carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

pub struct PricingEngine {
    config: Arc<PricingConfig>,
    state: PricingState,
    manual_value: Option<Decimal>,
    /// Set once a calculation succeeded; cleared by failures and reset
    has_baseline: bool,
    latest_token: u64,
}

impl PricingEngine {
    pub fn new(config: Arc<PricingConfig>) -> Self {
        Self {
            config,
            state: PricingState::default(),
            manual_value: None,
            has_baseline: false,
            latest_token: 0,
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn state(&self) -> &PricingState {
        &self.state
    }

    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    /// Issue a token for a new calculation, superseding all earlier ones.
    pub fn begin_request(&mut self) -> RequestToken {
        self.latest_token += 1;
        RequestToken(self.latest_token)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest_token
    }

    /// Apply the outcome of a distance lookup issued under `token`.
    ///
    /// Prices use the outskirts flag as it stands now, so a toggle made
    /// while the lookup was in flight is not lost. A failed lookup zeroes
    /// every computed price and clears the distance rather than keeping a
    /// stale price around. A stale token leaves the state untouched.
    pub fn apply_calculation(
        &mut self,
        token: RequestToken,
        vehicle: VehicleQuote,
        lookup: Result<DistanceSnapshot, DistanceFailure>,
    ) -> Result<PriceCalculation, PricingError> {
        if !self.is_current(token) {
            tracing::debug!(
                token = token.0,
                latest = self.latest_token,
                "Discarding stale pricing result"
            );
            return Err(PricingError::Superseded);
        }

        let distance = match lookup {
            Ok(distance) => distance,
            Err(failure) => {
                self.clear_prices();
                return Err(PricingError::Distance(failure));
            }
        };

        let calculation =
            calculators::calculate_price(&self.config, &vehicle, &distance, self.state.outskirts);

        self.state.calculated_prices = calculation.tier_prices;
        self.state.base_price_final = calculation.tier_prices.regular;
        self.state.distance_snapshot = Some(distance);
        self.state.breakdown = calculation.breakdown.clone();
        self.state.vehicle_warning = calculation.vehicle_warning.clone();
        self.has_baseline = true;
        self.refresh_selection();

        tracing::debug!(
            token = token.0,
            regular = %calculation.tier_prices.regular,
            plus25 = %calculation.tier_prices.plus25,
            plus50 = %calculation.tier_prices.plus50,
            "Price calculated"
        );

        Ok(PriceCalculation {
            breakdown: self.state.breakdown.clone(),
            ..calculation
        })
    }

    /// Record that the request under `token` could not run because inputs
    /// are incomplete. Prices show as zero until inputs are complete.
    pub fn decline(&mut self, token: RequestToken) -> PricingError {
        if !self.is_current(token) {
            return PricingError::Superseded;
        }
        self.clear_prices();
        PricingError::IncompleteInput
    }

    /// Select a pricing tier.
    ///
    /// Manual mode without an amount is a valid incomplete state: the
    /// final price stays blank.
    pub fn select_tier(&mut self, tier: Tier, manual_value: Option<Decimal>) {
        self.state.selected_tier = Some(tier);
        self.state.manual_mode = tier == Tier::Manual;
        self.manual_value = if tier == Tier::Manual { manual_value } else { None };
        self.refresh_selection();
    }

    /// Toggle the outskirts surcharge.
    ///
    /// Without a successful calculation to start from, only the flag is
    /// stored; prices update on the next full calculation.
    pub fn set_outskirts(&mut self, outskirts: bool) {
        self.state.outskirts = outskirts;
        if !self.has_baseline {
            return;
        }

        let base_subtotal = self.state.breakdown.base_subtotal;
        let (after_outskirts, before_vat, tier_prices) =
            calculators::price_from_subtotal(&self.config, base_subtotal, outskirts);

        let breakdown = &mut self.state.breakdown;
        breakdown.after_outskirts = after_outskirts;
        breakdown.outskirts_amount = after_outskirts - base_subtotal;
        breakdown.tier_prices_before_vat = before_vat;

        self.state.calculated_prices = tier_prices;
        self.state.base_price_final = tier_prices.regular;
        self.refresh_selection();
    }

    /// Back to the initial state (after submission or an explicit reset).
    /// Outstanding requests are superseded.
    pub fn reset(&mut self) {
        self.state = PricingState::default();
        self.manual_value = None;
        self.has_baseline = false;
        self.latest_token += 1;
    }

    fn clear_prices(&mut self) {
        self.state.calculated_prices = TierValues::zero();
        self.state.base_price_final = Decimal::ZERO;
        self.state.distance_snapshot = None;
        self.state.breakdown = PriceBreakdown::default();
        self.state.vehicle_warning = None;
        self.has_baseline = false;
        self.refresh_selection();
    }

    /// Recompute the final price and the tier-specific breakdown fields for
    /// whichever tier is selected.
    fn refresh_selection(&mut self) {
        let view_tier = self.state.selected_tier.unwrap_or(Tier::Regular);
        let view = TierView::for_tier(
            &self.config,
            &self.state.breakdown,
            &self.state.calculated_prices,
            view_tier,
            self.manual_value,
        );
        view.unwrap_or_else(TierView::blank)
            .apply(&mut self.state.breakdown);

        self.state.final_price = match self.state.selected_tier {
            None => Some(Decimal::ZERO),
            Some(_) => view.map(|v| v.final_total),
        };
    }
}
