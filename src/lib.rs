//! Towing dispatch backend.
//!
//! Pricing engine for tow jobs plus the HTTP surface the dispatch form
//! talks to: per-form sessions, distance proxying and webhook submission.

pub mod cache;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod pricing;
pub mod routes;

use anyhow::Context;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cache::SessionStore;
use crate::config::Settings;
use crate::dispatch::{FormSession, WebhookClient};
use crate::pricing::providers::{
    Clock, ConfigVehicleCatalog, DistanceMatrixClient, DistanceProvider, SystemClock,
    VehicleDataProvider,
};
use crate::pricing::{PricingConfig, PricingSession};

pub use routes::create_router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pricing_config: Arc<PricingConfig>,
    pub sessions: SessionStore,
    pub vehicles: Arc<dyn VehicleDataProvider>,
    pub distance: Arc<dyn DistanceProvider>,
    pub clock: Arc<dyn Clock>,
    pub webhook: Option<WebhookClient>,
}

impl AppState {
    /// Wire production collaborators from settings
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let pricing_config = Arc::new(settings.pricing.clone());

        let distance = DistanceMatrixClient::with_timeout(
            settings.distance.api_url.clone(),
            settings.distance.api_key.clone(),
            settings.distance.timeout(),
        )
        .context("Failed to build distance client")?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build webhook client")?;
        let webhook = settings
            .submission
            .webhook_url
            .clone()
            .map(|url| WebhookClient::new(http, url));

        Ok(Self::with_providers(
            settings,
            Arc::new(ConfigVehicleCatalog::new(pricing_config)),
            Arc::new(distance),
            Arc::new(SystemClock),
            webhook,
        ))
    }

    /// Assemble state around explicit collaborators
    pub fn with_providers(
        settings: Settings,
        vehicles: Arc<dyn VehicleDataProvider>,
        distance: Arc<dyn DistanceProvider>,
        clock: Arc<dyn Clock>,
        webhook: Option<WebhookClient>,
    ) -> Self {
        let sessions = SessionStore::new(
            settings.sessions.max_capacity,
            Duration::from_secs(settings.sessions.idle_minutes * 60),
        );
        Self {
            pricing_config: Arc::new(settings.pricing.clone()),
            settings: Arc::new(settings),
            sessions,
            vehicles,
            distance,
            clock,
            webhook,
        }
    }

    /// New form session wired to this state's collaborators
    pub fn new_session(&self) -> FormSession {
        let pricing = PricingSession::new(
            self.pricing_config.clone(),
            self.vehicles.clone(),
            self.distance.clone(),
            self.settings.distance.timeout(),
        );
        FormSession::new(Uuid::new_v4(), pricing, self.settings.debounce)
    }
}
