//! File-based configuration.
//!
//! Everything here is optional; an empty file (or no file) gives the
//! built-in table, the default search radius and the Nominatim policy.
//!
//! ```toml
//! [resolver]
//! search_radius_m = 150000.0
//!
//! [timezone]
//! dataset = "data/extra-cities.csv"
//!
//! [address]
//! default_provider = "nominatim"
//! country_lookup = true
//!
//! [policies.myvendor]
//! locality = ["town", "city"]
//! ```

use crate::address::{builtin_policy, FieldPolicy};
use crate::error::{Error, Result};
use crate::timezone::{ResolverConfig, TimezoneTable};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// CSV file replacing the embedded reference table.
    pub dataset: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Policy id used when none is given on the command line.
    pub default_provider: String,
    /// Backfill country names from codes with the built-in table.
    pub country_lookup: bool,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self { default_provider: "nominatim".to_string(), country_lookup: true }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub timezone: TimezoneConfig,
    pub address: AddressConfig,
    /// Extra provider policies by id. These shadow built-ins.
    pub policies: BTreeMap<String, FieldPolicy>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        if !(config.resolver.search_radius_m.is_finite() && config.resolver.search_radius_m > 0.0) {
            return Err(Error::Config(format!(
                "resolver.search_radius_m must be a positive number, got {}",
                config.resolver.search_radius_m
            )));
        }
        Ok(config)
    }

    /// Load a config file. Relative dataset paths are resolved against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(dataset), Some(dir)) = (config.timezone.dataset.as_mut(), path.parent()) {
            if dataset.is_relative() {
                *dataset = dir.join(&*dataset);
            }
        }
        debug!(path = %path.display(), policies = config.policies.len(), "config loaded");
        Ok(config)
    }

    /// Policy by id: a configured policy first, then a built-in one.
    pub fn policy(&self, id: &str) -> Option<FieldPolicy> {
        self.policies
            .get(id)
            .or_else(|| self.policies.get(&id.to_lowercase()))
            .cloned()
            .or_else(|| builtin_policy(id))
    }

    /// Replacement reference table, if one is configured.
    pub fn dataset(&self) -> Result<Option<TimezoneTable>> {
        self.timezone.dataset.as_ref().map(TimezoneTable::from_path).transpose()
    }
}
