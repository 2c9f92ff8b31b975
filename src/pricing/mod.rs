//! Pricing engine module for tow dispatch.
//!
//! Turns vehicle category, distance, outskirts flag and tier selection into
//! VAT-inclusive prices with a full breakdown.

pub mod calculators;
pub mod engine;
pub mod models;
pub mod providers;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod tiers;

// Re-export commonly used items
pub use calculators::round_money;
pub use engine::{PricingEngine, RequestToken};
pub use models::{PriceBreakdown, PriceCalculation, PricingConfig, PricingState, Tier, TierValues};
pub use routes::router;
pub use services::{PricingError, PricingInput, PricingSession};
pub use tiers::get_recommended_tier;
