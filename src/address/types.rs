//! Raw and canonical address records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fields of a [`CanonicalAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    StreetAddress,
    ExtendedAddress,
    Locality,
    Region,
    CountryName,
    CountryCode,
    PostalCode,
    DisplayName,
    Latitude,
    Longitude,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        Self::Name,
        Self::StreetAddress,
        Self::ExtendedAddress,
        Self::Locality,
        Self::Region,
        Self::CountryName,
        Self::CountryCode,
        Self::PostalCode,
        Self::DisplayName,
        Self::Latitude,
        Self::Longitude,
    ];

    /// Components joined into `display_name`, in order.
    pub const DISPLAY_ORDER: [CanonicalField; 6] = [
        Self::Name,
        Self::StreetAddress,
        Self::ExtendedAddress,
        Self::Locality,
        Self::Region,
        Self::CountryName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::StreetAddress => "street_address",
            Self::ExtendedAddress => "extended_address",
            Self::Locality => "locality",
            Self::Region => "region",
            Self::CountryName => "country_name",
            Self::CountryCode => "country_code",
            Self::PostalCode => "postal_code",
            Self::DisplayName => "display_name",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider response as an open key/value mapping.
///
/// Keys are whatever the provider uses. Values are expected to be strings
/// or numbers; other JSON types are ignored by the normalizer. The original
/// document can ride along in `payload` for debugging and for dotted-path
/// lookups such as `address.road`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAddress {
    fields: Map<String, Value>,
    payload: Option<Value>,
}

impl RawAddress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a vendor JSON document. Top-level object keys become fields and
    /// the whole document is kept as the payload.
    pub fn from_json(document: Value) -> Self {
        let fields = match &document {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        Self { fields, payload: Some(document) }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up `key` as a literal field name first, then as a dotted path
    /// into nested objects (`address.road`). Numeric segments index arrays
    /// (`point.coordinates.0`).
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(v) = self.fields.get(key) {
            return Some(v);
        }
        if !key.contains('.') {
            return None;
        }
        let mut parts = key.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Text value of `key`: trimmed, non-empty strings and numbers only.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numeric value of `key`, accepting numbers and numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawAddress {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut raw = RawAddress::new();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

/// Provider-independent address with a fixed schema.
///
/// Only meaningfully populated text fields are present; latitude and
/// longitude are always set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    /// ISO 3166-1 alpha-2, upper case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl CanonicalAddress {
    /// Text value of a field. Latitude/longitude are not text and return None.
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        let value = match field {
            CanonicalField::Name => &self.name,
            CanonicalField::StreetAddress => &self.street_address,
            CanonicalField::ExtendedAddress => &self.extended_address,
            CanonicalField::Locality => &self.locality,
            CanonicalField::Region => &self.region,
            CanonicalField::CountryName => &self.country_name,
            CanonicalField::CountryCode => &self.country_code,
            CanonicalField::PostalCode => &self.postal_code,
            CanonicalField::DisplayName => &self.display_name,
            CanonicalField::Latitude | CanonicalField::Longitude => return None,
        };
        value.as_deref()
    }

    /// Whether a field carries a value.
    pub fn has(&self, field: CanonicalField) -> bool {
        matches!(field, CanonicalField::Latitude | CanonicalField::Longitude) || self.get(field).is_some()
    }

    /// This record as a raw mapping keyed by canonical field names.
    pub fn to_raw(&self) -> RawAddress {
        let mut raw = RawAddress::new();
        for field in CanonicalField::ALL {
            if let Some(v) = self.get(field) {
                raw.insert(field.as_str(), v);
            }
        }
        raw.insert(CanonicalField::Latitude.as_str(), self.latitude);
        raw.insert(CanonicalField::Longitude.as_str(), self.longitude);
        raw
    }
}
