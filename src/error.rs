//! Error taxonomy shared by every geoframe operation.

use crate::address::CanonicalField;
use crate::daylight::{PolarCondition, SolarEventKind};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by geoframe operations.
///
/// Every failure is a value handed back to the caller; nothing in the
/// library aborts the process on bad input.
#[derive(Debug, Error)]
pub enum Error {
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or NaN.
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },

    /// Elevation is not a finite number of meters.
    #[error("Invalid elevation: {0} m")]
    InvalidElevation(f64),

    /// No timezone reference lies within the search radius.
    #[error("No timezone reference within {radius_km:.0} km of {latitude:.4}, {longitude:.4}")]
    TimezoneNotFound {
        /// Queried latitude.
        latitude: f64,
        /// Queried longitude.
        longitude: f64,
        /// Search radius that was applied.
        radius_km: f64,
    },

    /// The sun does not cross the event horizon on this date.
    #[error("No {kind} on {date}: {condition}")]
    NoSolarEvent {
        /// Which event was requested.
        kind: SolarEventKind,
        /// Calendar date of the request.
        date: NaiveDate,
        /// Why the event does not occur.
        condition: PolarCondition,
    },

    /// A field the policy marks as required could not be populated.
    #[error("Required field '{0}' is missing from the provider response")]
    MissingRequiredField(CanonicalField),

    /// A country code is present but no name could be found for it.
    #[error("Country code '{0}' could not be resolved to a country name")]
    UnresolvableCountry(String),

    /// Zone name not present in the tz database.
    #[error("Unknown timezone '{0}'")]
    UnknownZone(String),

    /// A timezone reference dataset row failed validation.
    #[error("Timezone dataset line {line}: {message}")]
    Dataset {
        /// 1-based line number in the source, header included.
        line: u64,
        /// What was wrong with the row.
        message: String,
    },

    /// Configuration parsed but holds an unusable value.
    #[error("Config error: {0}")]
    Config(String),

    /// A config file or provider policy is not valid TOML for its schema.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Input JSON is malformed, or output could not be encoded.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
