//! geoframe — coordinate intelligence.
//!
//! Three pure operations over a geographic point:
//!
//! - [`TimezoneResolver::resolve`]: IANA zone and DST-aware offset
//! - [`SolarCalculator::event`]: elevation-aware sunrise / sunset
//! - [`normalize`]: any reverse-geocoding payload → [`CanonicalAddress`]
//!
//! plus great-circle [`distance`].

pub mod address;
pub mod config;
pub mod daylight;
pub mod error;
pub mod geo;
pub mod solar;
pub mod timezone;

pub use address::{normalize, AddressNormalizer, CanonicalAddress, CountryLookup, FieldPolicy, RawAddress};
pub use config::Config;
pub use daylight::{PolarCondition, SolarCalculator, SolarEvent, SolarEventKind};
pub use error::{Error, Result};
pub use geo::{distance, Coordinate};
pub use timezone::{ResolvedTimezone, TimezoneResolver, TimezoneTable};
