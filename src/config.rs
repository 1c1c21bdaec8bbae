//! Application configuration.
//!
//! Every section has working defaults, so a config file only needs the keys
//! it changes. Environment variables override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::ApiConfig;
use crate::error::{Error, Result};
use crate::osrm::OsrmConfig;
use crate::sequencer::SequencerConfig;
use crate::tracker::TrackerConfig;

pub const ENV_API_URL: &str = "ROUTE_API_URL";
pub const ENV_OSRM_URL: &str = "OSRM_BASE_URL";
pub const ENV_TOKEN_PATH: &str = "ROUTE_TOKEN_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub osrm: OsrmConfig,
    pub sequencer: SequencerConfig,
    pub tracker: TrackerConfig,
    /// Where the session token is persisted. `None` keeps it in memory only.
    pub token_path: Option<PathBuf>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file and applies environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(url) = lookup(ENV_OSRM_URL) {
            self.osrm.base_url = url;
        }
        if let Some(path) = lookup(ENV_TOKEN_PATH) {
            self.token_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url is empty".into()));
        }
        if self.osrm.base_url.trim().is_empty() {
            return Err(Error::Config("osrm.base_url is empty".into()));
        }
        let threshold = self.tracker.arrival_threshold_km;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(Error::Config(format!(
                "tracker.arrival_threshold_km must be positive, got {}",
                threshold
            )));
        }
        let speed = self.sequencer.speed_kmh;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(Error::Config(format!(
                "sequencer.speed_kmh must be positive, got {}",
                speed
            )));
        }
        Ok(())
    }
}
