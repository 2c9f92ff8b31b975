//! Pricing domain models.
//!
//! Configuration, tier identifiers, and the derived state the engine exposes
//! to the HTTP layer and to the submission payload.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::services::PricingError;

/// Vehicle category that determines the flat base price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Private,
    Motorcycle,
    Heavy,
    Machinery,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::Private,
        VehicleCategory::Motorcycle,
        VehicleCategory::Heavy,
        VehicleCategory::Machinery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Private => "private",
            VehicleCategory::Motorcycle => "motorcycle",
            VehicleCategory::Heavy => "heavy",
            VehicleCategory::Machinery => "machinery",
        }
    }

    /// Human-readable label shown next to the base price
    pub fn label(&self) -> &'static str {
        match self {
            VehicleCategory::Private => "Private car",
            VehicleCategory::Motorcycle => "Motorcycle",
            VehicleCategory::Heavy => "Heavy vehicle",
            VehicleCategory::Machinery => "Machinery",
        }
    }

    /// Case-insensitive lookup; `None` for anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
    }
}

/// Pricing mode chosen by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Regular,
    Plus25,
    Plus50,
    Manual,
}

impl Tier {
    /// The three computed tiers, in ascending price order
    pub const COMPUTED: [Tier; 3] = [Tier::Regular, Tier::Plus25, Tier::Plus50];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Regular => "regular",
            Tier::Plus25 => "plus25",
            Tier::Plus50 => "plus50",
            Tier::Manual => "manual",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Tier::Regular),
            "plus25" => Ok(Tier::Plus25),
            "plus50" => Ok(Tier::Plus50),
            "manual" => Ok(Tier::Manual),
            other => Err(PricingError::UnknownTier(other.to_string())),
        }
    }
}

/// One value per computed tier (prices or multipliers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierValues {
    pub regular: Decimal,
    pub plus25: Decimal,
    pub plus50: Decimal,
}

impl TierValues {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Value for a computed tier; `None` for `Tier::Manual`.
    pub fn get(&self, tier: Tier) -> Option<Decimal> {
        match tier {
            Tier::Regular => Some(self.regular),
            Tier::Plus25 => Some(self.plus25),
            Tier::Plus50 => Some(self.plus50),
            Tier::Manual => None,
        }
    }

    pub fn map(&self, f: impl Fn(Decimal) -> Decimal) -> Self {
        Self {
            regular: f(self.regular),
            plus25: f(self.plus25),
            plus50: f(self.plus50),
        }
    }
}

/// Base price per vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrices {
    pub private: Decimal,
    pub motorcycle: Decimal,
    pub heavy: Decimal,
    pub machinery: Decimal,
}

impl BasePrices {
    pub fn get(&self, category: VehicleCategory) -> Decimal {
        match category {
            VehicleCategory::Private => self.private,
            VehicleCategory::Motorcycle => self.motorcycle,
            VehicleCategory::Heavy => self.heavy,
            VehicleCategory::Machinery => self.machinery,
        }
    }
}

impl Default for BasePrices {
    fn default() -> Self {
        Self {
            private: dec!(200),
            motorcycle: dec!(200),
            heavy: dec!(400),
            machinery: dec!(600),
        }
    }
}

/// Boundaries used to classify a date/time into a recommended tier.
///
/// Every window is half-open: it starts at its start time and ends just
/// before its end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindows {
    /// Sun-Thu evening surcharge starts
    pub evening_start: NaiveTime,
    /// Sun-Thu night surcharge starts (evening ends)
    pub night_start: NaiveTime,
    /// Mon-Fri night surcharge ends
    pub night_end: NaiveTime,
    /// Friday weekend surcharge starts
    pub weekend_start: NaiveTime,
    /// Sunday weekend surcharge ends
    pub weekend_end: NaiveTime,
}

fn at_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for TimeWindows {
    fn default() -> Self {
        Self {
            evening_start: at_hour(15),
            night_start: at_hour(19),
            night_end: at_hour(7),
            weekend_start: at_hour(14),
            weekend_end: at_hour(7),
        }
    }
}

/// Process-wide pricing constants, loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_prices: BasePrices,
    pub travel_price_per_km: Decimal,
    /// VAT as a multiplier (1.18 means 18%)
    pub vat_rate: Decimal,
    pub outskirts_multiplier: Decimal,
    pub tier_multipliers: TierValues,
    pub time_windows: TimeWindows,
    /// Description used when the vehicle category cannot be resolved
    pub fallback_description: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_prices: BasePrices::default(),
            travel_price_per_km: dec!(10),
            vat_rate: dec!(1.18),
            outskirts_multiplier: dec!(1.25),
            tier_multipliers: TierValues {
                regular: dec!(1),
                plus25: dec!(1.25),
                plus50: dec!(1.50),
            },
            time_windows: TimeWindows::default(),
            fallback_description: "default".to_string(),
        }
    }
}

impl PricingConfig {
    /// Reject configurations the calculators cannot work with.
    pub fn validate(&self) -> Result<(), PricingError> {
        let mut errors = Vec::new();

        if self.vat_rate <= Decimal::ZERO {
            errors.push(format!("vat_rate must be positive, got {}", self.vat_rate));
        }
        if self.outskirts_multiplier <= Decimal::ZERO {
            errors.push(format!(
                "outskirts_multiplier must be positive, got {}",
                self.outskirts_multiplier
            ));
        }
        if self.travel_price_per_km < Decimal::ZERO {
            errors.push("travel_price_per_km must not be negative".to_string());
        }
        for category in VehicleCategory::ALL {
            if self.base_prices.get(category) < Decimal::ZERO {
                errors.push(format!("base price for {} must not be negative", category.as_str()));
            }
        }

        let m = &self.tier_multipliers;
        if m.regular != Decimal::ONE {
            errors.push(format!("regular tier multiplier must be exactly 1, got {}", m.regular));
        }
        if !(m.regular <= m.plus25 && m.plus25 <= m.plus50) {
            errors.push("tier multipliers must be non-decreasing (regular <= plus25 <= plus50)".to_string());
        }

        let w = &self.time_windows;
        if w.evening_start >= w.night_start {
            errors.push(format!(
                "time_windows.evening_start ({}) must be before night_start ({})",
                w.evening_start, w.night_start
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PricingError::Configuration {
                message: "Invalid pricing configuration".to_string(),
                errors,
            })
        }
    }
}

/// Base price resolved for a vehicle category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleQuote {
    pub category: VehicleCategory,
    pub base_price: Decimal,
    pub description: String,
    /// False when the requested category was unknown and the fallback applied
    pub resolved: bool,
    pub requested: Option<String>,
}

/// Last successful distance lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceSnapshot {
    pub distance_km: u32,
    pub distance_text: String,
    pub duration_text: String,
}

/// Itemized derivation of the price shown to the dispatcher.
///
/// Never mutated field by field from outside the pricing module: the
/// calculators fill the tier-independent part, `TierView` fills the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub vehicle_base_price: Decimal,
    pub vehicle_description: String,
    pub travel_distance_km: u32,
    pub travel_price: Decimal,
    pub base_subtotal: Decimal,
    pub outskirts_amount: Decimal,
    pub after_outskirts: Decimal,
    pub tier_prices_before_vat: TierValues,
    pub time_surcharge: Decimal,
    pub subtotal_before_vat: Decimal,
    pub vat_amount: Decimal,
    pub final_total: Decimal,
}

/// Result of a full price calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceCalculation {
    pub vehicle: VehicleQuote,
    pub distance: DistanceSnapshot,
    pub outskirts: bool,
    /// VAT-inclusive price per tier
    pub tier_prices: TierValues,
    pub breakdown: PriceBreakdown,
    pub vehicle_warning: Option<String>,
}

/// Mutable pricing state for one form session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingState {
    /// Regular-tier price after VAT
    pub base_price_final: Decimal,
    pub outskirts: bool,
    /// `None` until the dispatcher picks a tier
    pub selected_tier: Option<Tier>,
    pub calculated_prices: TierValues,
    /// `Some(0)` before any selection, `None` for a blank manual price
    pub final_price: Option<Decimal>,
    pub manual_mode: bool,
    pub distance_snapshot: Option<DistanceSnapshot>,
    pub breakdown: PriceBreakdown,
    pub vehicle_warning: Option<String>,
}

impl Default for PricingState {
    fn default() -> Self {
        Self {
            base_price_final: Decimal::ZERO,
            outskirts: false,
            selected_tier: None,
            calculated_prices: TierValues::zero(),
            final_price: Some(Decimal::ZERO),
            manual_mode: false,
            distance_snapshot: None,
            breakdown: PriceBreakdown::default(),
            vehicle_warning: None,
        }
    }
}
