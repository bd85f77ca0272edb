//! Club settings loading from config.toml
//!
//! The file is optional: a missing file yields [`ClubConfig::default`], which carries the
//! badminton club's category list and dues amount. Any field left out of the file takes
//! its default as well.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Settings shared by every operation that needs more than the database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Club name used in report titles
    pub name: String,
    /// Suggested monthly dues amount in rupiah
    pub dues_amount: f64,
    /// Days between reminder generation and its due date
    pub reminder_lead_days: u64,
    /// Known transaction/budget categories
    pub categories: Vec<CategoryConfig>,
}

/// One entry of the fixed category set
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Stored value, e.g. `"sewa-lapangan"`
    pub value: String,
    /// Display label, e.g. `"Sewa Lapangan"`
    pub label: String,
}

impl CategoryConfig {
    fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            name: "Ekstrakurikuler Badminton".to_string(),
            dues_amount: 25_000.0,
            reminder_lead_days: 3,
            categories: vec![
                CategoryConfig::new("kas-anggota", "Kas Anggota"),
                CategoryConfig::new("peralatan", "Peralatan"),
                CategoryConfig::new("sewa-lapangan", "Sewa Lapangan"),
                CategoryConfig::new("konsumsi", "Konsumsi"),
                CategoryConfig::new("transport", "Transport"),
                CategoryConfig::new("turnamen", "Turnamen"),
                CategoryConfig::new("lainnya", "Lainnya"),
            ],
        }
    }
}

impl ClubConfig {
    /// Display label for a stored category value, if it is one of the known categories.
    #[must_use]
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.value == value)
            .map(|category| category.label.as_str())
    }

    fn validate(self) -> Result<Self> {
        if !self.dues_amount.is_finite() || self.dues_amount < 0.0 {
            return Err(Error::Config {
                message: format!(
                    "dues_amount must be a non-negative number, got {}",
                    self.dues_amount
                ),
            });
        }
        Ok(self)
    }
}

/// Parses club settings from TOML text.
pub fn parse_config(contents: &str) -> Result<ClubConfig> {
    let config: ClubConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads club settings from a TOML file, falling back to defaults when it does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClubConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(ClubConfig::default());
    }

    debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads club settings from `KAS_CONFIG`, or `./config.toml` when unset.
pub fn load_default_config() -> Result<ClubConfig> {
    let path = std::env::var("KAS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
