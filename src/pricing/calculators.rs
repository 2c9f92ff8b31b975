//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no providers, no session state.
//! Every rounding boundary goes through `round_money` to whole currency units.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use super::models::{
    DistanceSnapshot, PriceBreakdown, PriceCalculation, PricingConfig, Tier, TierValues,
    VehicleQuote,
};

/// Prices are quoted in whole currency units.
pub const MONEY_PLACES: u32 = 0;

/// Round to specified decimal places, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use tow_dispatch::pricing::round_money;
///
/// assert_eq!(round_money(dec!(442.5), 0), dec!(443));
/// assert_eq!(round_money(dec!(468.75), 0), dec!(469));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

fn round_whole(amount: Decimal) -> Decimal {
    round_money(amount, MONEY_PLACES)
}

/// Distance-based travel surcharge. Not rounded.
pub fn travel_price(config: &PricingConfig, distance_km: u32) -> Decimal {
    Decimal::from(distance_km) * config.travel_price_per_km
}

/// Apply the outskirts multiplier to the base subtotal when the flag is set.
pub fn apply_outskirts(config: &PricingConfig, base_subtotal: Decimal, outskirts: bool) -> Decimal {
    if outskirts {
        round_whole(base_subtotal * config.outskirts_multiplier)
    } else {
        base_subtotal
    }
}

/// Per-tier prices before VAT.
pub fn tier_prices_before_vat(config: &PricingConfig, after_outskirts: Decimal) -> TierValues {
    let m = &config.tier_multipliers;
    TierValues {
        regular: round_whole(after_outskirts * m.regular),
        plus25: round_whole(after_outskirts * m.plus25),
        plus50: round_whole(after_outskirts * m.plus50),
    }
}

/// VAT-inclusive per-tier prices.
pub fn apply_vat(config: &PricingConfig, before_vat: &TierValues) -> TierValues {
    before_vat.map(|amount| round_whole(amount * config.vat_rate))
}

/// Steps 3-5 of the calculation, starting from a known base subtotal.
///
/// Shared by the full calculation and by outskirts toggling, which only
/// has the cached subtotal to work from.
pub fn price_from_subtotal(
    config: &PricingConfig,
    base_subtotal: Decimal,
    outskirts: bool,
) -> (Decimal, TierValues, TierValues) {
    let after_outskirts = apply_outskirts(config, base_subtotal, outskirts);
    let before_vat = tier_prices_before_vat(config, after_outskirts);
    let tier_prices = apply_vat(config, &before_vat);
    (after_outskirts, before_vat, tier_prices)
}

/// Full price calculation for a resolved vehicle and a known distance.
///
/// Deterministic: identical inputs always give identical output. The
/// breakdown's tier-specific fields show the regular tier until a
/// `TierView` is applied.
pub fn calculate_price(
    config: &PricingConfig,
    vehicle: &VehicleQuote,
    distance: &DistanceSnapshot,
    outskirts: bool,
) -> PriceCalculation {
    let travel = travel_price(config, distance.distance_km);
    let base_subtotal = vehicle.base_price + travel;
    let (after_outskirts, before_vat, tier_prices) =
        price_from_subtotal(config, base_subtotal, outskirts);

    let mut breakdown = PriceBreakdown {
        vehicle_base_price: vehicle.base_price,
        vehicle_description: vehicle.description.clone(),
        travel_distance_km: distance.distance_km,
        travel_price: travel,
        base_subtotal,
        outskirts_amount: after_outskirts - base_subtotal,
        after_outskirts,
        tier_prices_before_vat: before_vat,
        ..PriceBreakdown::default()
    };
    if let Some(view) = TierView::for_tier(config, &breakdown, &tier_prices, Tier::Regular, None) {
        view.apply(&mut breakdown);
    }

    let vehicle_warning = if vehicle.resolved {
        None
    } else {
        Some(unresolved_vehicle_warning(vehicle))
    };

    PriceCalculation {
        vehicle: vehicle.clone(),
        distance: distance.clone(),
        outskirts,
        tier_prices,
        breakdown,
        vehicle_warning,
    }
}

fn unresolved_vehicle_warning(vehicle: &VehicleQuote) -> String {
    match vehicle.requested.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(requested) => format!(
            "Unknown vehicle category '{}'; using {} base price of {}",
            requested, vehicle.description, vehicle.base_price
        ),
        None => format!(
            "No vehicle category selected; using {} base price of {}",
            vehicle.description, vehicle.base_price
        ),
    }
}

/// Tier-specific part of the breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierView {
    pub time_surcharge: Decimal,
    pub subtotal_before_vat: Decimal,
    pub vat_amount: Decimal,
    pub final_total: Decimal,
}

impl TierView {
    /// Derive the view for `tier`.
    ///
    /// Computed tiers add VAT on top of their pre-VAT price. Manual mode
    /// infers VAT out of the typed amount instead. Returns `None` when
    /// manual mode has no amount yet.
    pub fn for_tier(
        config: &PricingConfig,
        breakdown: &PriceBreakdown,
        tier_prices: &TierValues,
        tier: Tier,
        manual_value: Option<Decimal>,
    ) -> Option<TierView> {
        match (tier_prices.get(tier), breakdown.tier_prices_before_vat.get(tier)) {
            (Some(final_total), Some(before_vat)) => Some(TierView {
                time_surcharge: before_vat - breakdown.after_outskirts,
                subtotal_before_vat: before_vat,
                vat_amount: final_total - before_vat,
                final_total,
            }),
            _ => manual_value.map(|manual| Self::manual(config, manual)),
        }
    }

    fn manual(config: &PricingConfig, manual: Decimal) -> TierView {
        let subtotal = manual
            .checked_div(config.vat_rate)
            .map(round_whole)
            .unwrap_or(manual);
        TierView {
            time_surcharge: Decimal::ZERO,
            subtotal_before_vat: subtotal,
            vat_amount: manual - subtotal,
            final_total: manual,
        }
    }

    /// View used while a manual price is still blank
    pub fn blank() -> TierView {
        TierView {
            time_surcharge: Decimal::ZERO,
            subtotal_before_vat: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            final_total: Decimal::ZERO,
        }
    }

    pub fn apply(&self, breakdown: &mut PriceBreakdown) {
        breakdown.time_surcharge = self.time_surcharge;
        breakdown.subtotal_before_vat = self.subtotal_before_vat;
        breakdown.vat_amount = self.vat_amount;
        breakdown.final_total = self.final_total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::VehicleCategory;
    use rust_decimal_macros::dec;

    fn private_car() -> VehicleQuote {
        VehicleQuote {
            category: VehicleCategory::Private,
            base_price: dec!(200),
            description: "Private car".to_string(),
            resolved: true,
            requested: Some("private".to_string()),
        }
    }

    fn km(distance_km: u32) -> DistanceSnapshot {
        DistanceSnapshot {
            distance_km,
            distance_text: format!("{} km", distance_km),
            duration_text: "15 mins".to_string(),
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_halves_round_up() {
        assert_eq!(round_money(dec!(442.5), 0), dec!(443));
        assert_eq!(round_money(dec!(562.5), 0), dec!(563));
        assert_eq!(round_money(dec!(2.5), 0), dec!(3));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(553.42), 0), dec!(553));
        assert_eq!(round_money(dec!(664.34), 0), dec!(664));
    }

    #[test]
    fn test_round_money_zero() {
        assert_eq!(round_money(dec!(0), 0), dec!(0));
    }

    // ==================== calculate_price tests ====================

    #[test]
    fn test_calculate_price_regular_scenario() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), false);

        assert_eq!(calc.breakdown.travel_price, dec!(100));
        assert_eq!(calc.breakdown.base_subtotal, dec!(300));
        assert_eq!(calc.breakdown.after_outskirts, dec!(300));
        assert_eq!(calc.breakdown.outskirts_amount, dec!(0));
        assert_eq!(calc.breakdown.tier_prices_before_vat.regular, dec!(300));
        assert_eq!(calc.breakdown.tier_prices_before_vat.plus25, dec!(375));
        assert_eq!(calc.breakdown.tier_prices_before_vat.plus50, dec!(450));
        assert_eq!(calc.tier_prices.regular, dec!(354));
        assert_eq!(calc.tier_prices.plus25, dec!(443));
        assert_eq!(calc.tier_prices.plus50, dec!(531));
        assert!(calc.vehicle_warning.is_none());
    }

    #[test]
    fn test_calculate_price_outskirts_scenario() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), true);

        assert_eq!(calc.breakdown.after_outskirts, dec!(375));
        assert_eq!(calc.breakdown.outskirts_amount, dec!(75));
        assert_eq!(calc.breakdown.tier_prices_before_vat.regular, dec!(375));
        assert_eq!(calc.breakdown.tier_prices_before_vat.plus25, dec!(469));
        assert_eq!(calc.breakdown.tier_prices_before_vat.plus50, dec!(563));
        assert_eq!(calc.tier_prices.regular, dec!(443));
        assert_eq!(calc.tier_prices.plus25, dec!(553));
        assert_eq!(calc.tier_prices.plus50, dec!(664));
    }

    #[test]
    fn test_regular_tier_matches_closed_form() {
        let config = PricingConfig::default();
        for (base, distance, outskirts) in [
            (dec!(200), 0u32, false),
            (dec!(400), 37, true),
            (dec!(600), 143, false),
            (dec!(200), 9, true),
        ] {
            let vehicle = VehicleQuote {
                base_price: base,
                ..private_car()
            };
            let calc = calculate_price(&config, &vehicle, &km(distance), outskirts);
            let subtotal = round_money(base + Decimal::from(distance) * dec!(10), 0);
            let multiplier = if outskirts { dec!(1.25) } else { dec!(1) };
            let expected = round_money(
                round_money(subtotal * multiplier, 0) * dec!(1.18),
                0,
            );
            assert_eq!(calc.tier_prices.regular, expected);
        }
    }

    #[test]
    fn test_tier_prices_are_monotonic() {
        let config = PricingConfig::default();
        for distance in [0u32, 1, 7, 10, 55, 250, 1000] {
            for outskirts in [false, true] {
                let calc = calculate_price(&config, &private_car(), &km(distance), outskirts);
                assert!(calc.tier_prices.plus50 >= calc.tier_prices.plus25);
                assert!(calc.tier_prices.plus25 >= calc.tier_prices.regular);
            }
        }
    }

    #[test]
    fn test_calculate_price_is_idempotent() {
        let config = PricingConfig::default();
        let first = calculate_price(&config, &private_car(), &km(23), true);
        let second = calculate_price(&config, &private_car(), &km(23), true);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.breakdown).unwrap(),
            serde_json::to_vec(&second.breakdown).unwrap()
        );
    }

    #[test]
    fn test_breakdown_defaults_to_regular_view() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), false);
        assert_eq!(calc.breakdown.subtotal_before_vat, dec!(300));
        assert_eq!(calc.breakdown.vat_amount, dec!(54));
        assert_eq!(calc.breakdown.time_surcharge, dec!(0));
        assert_eq!(calc.breakdown.final_total, dec!(354));
    }

    #[test]
    fn test_unresolved_vehicle_sets_warning() {
        let config = PricingConfig::default();
        let vehicle = VehicleQuote {
            description: "default".to_string(),
            resolved: false,
            requested: Some("hovercraft".to_string()),
            ..private_car()
        };
        let calc = calculate_price(&config, &vehicle, &km(10), false);
        let warning = calc.vehicle_warning.expect("warning expected");
        assert!(warning.contains("hovercraft"));
        assert_eq!(calc.tier_prices.regular, dec!(354));
    }

    // ==================== TierView tests ====================

    #[test]
    fn test_tier_view_plus50() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), false);
        let view = TierView::for_tier(&config, &calc.breakdown, &calc.tier_prices, Tier::Plus50, None)
            .unwrap();

        assert_eq!(view.time_surcharge, dec!(150));
        assert_eq!(view.subtotal_before_vat, dec!(450));
        assert_eq!(view.vat_amount, dec!(81));
        assert_eq!(view.final_total, dec!(531));
        assert_eq!(view.final_total, round_money(view.subtotal_before_vat * config.vat_rate, 0));
    }

    #[test]
    fn test_tier_view_manual_infers_vat() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), false);
        let view = TierView::for_tier(
            &config,
            &calc.breakdown,
            &calc.tier_prices,
            Tier::Manual,
            Some(dec!(500)),
        )
        .unwrap();

        // 500 / 1.18 = 423.73
        assert_eq!(view.subtotal_before_vat, dec!(424));
        assert_eq!(view.vat_amount, dec!(76));
        assert_eq!(view.final_total, dec!(500));
        assert_eq!(view.time_surcharge, dec!(0));
    }

    #[test]
    fn test_tier_view_manual_without_value() {
        let config = PricingConfig::default();
        let calc = calculate_price(&config, &private_car(), &km(10), false);
        let view =
            TierView::for_tier(&config, &calc.breakdown, &calc.tier_prices, Tier::Manual, None);
        assert!(view.is_none());
    }
}
