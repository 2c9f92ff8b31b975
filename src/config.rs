//! Application settings.
//!
//! Layered: built-in defaults, then an optional `config.toml`, then
//! `TOW_`-prefixed environment variables (`TOW_DISTANCE__API_KEY`, ...).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::debounce::DebounceSettings;
use crate::pricing::PricingConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DistanceSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for DistanceSettings {
    fn default() -> Self {
        Self {
            api_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            api_key: String::new(),
            timeout_ms: 5000,
        }
    }
}

impl DistanceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    /// Workflow webhook; submissions are refused while unset
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub max_capacity: u64,
    pub idle_minutes: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            idle_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub distance: DistanceSettings,
    pub submission: SubmissionSettings,
    pub debounce: DebounceSettings,
    pub sessions: SessionSettings,
    pub pricing: PricingConfig,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("TOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        settings
            .pricing
            .validate()
            .context("Invalid [pricing] configuration")?;

        if settings.distance.api_key.is_empty() {
            tracing::warn!("No distance API key configured; distance lookups will be denied");
        }

        Ok(settings)
    }
}
