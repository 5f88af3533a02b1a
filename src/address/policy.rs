//! Field-precedence policies and the built-in provider registry.
//!
//! Each reverse-geocoding provider names the same concepts differently. A
//! [`FieldPolicy`] lists, per canonical field, the provider keys to try in
//! order. Built-in policies live in TOML files under `policies/` and are
//! embedded at compile time.

use super::types::CanonicalField;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Candidate keys for the region, split by administrative level.
///
/// The normalizer decides the order between the two lists from the country
/// code; see [`super::normalizer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPolicy {
    /// State / province level keys.
    pub state: Vec<String>,
    /// County / district level keys.
    pub county: Vec<String>,
}

/// Ordered provider-key candidates per canonical field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPolicy {
    pub name: Vec<String>,
    /// House number keys, prefixed onto the street when both are present.
    pub street_number: Vec<String>,
    pub street_address: Vec<String>,
    pub extended_address: Vec<String>,
    pub locality: Vec<String>,
    pub region: RegionPolicy,
    pub country_name: Vec<String>,
    pub country_code: Vec<String>,
    pub postal_code: Vec<String>,
    /// Used verbatim only when no display component is populated.
    pub display_name: Vec<String>,
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
    /// Fields that must be populated for normalization to succeed.
    pub required: Vec<CanonicalField>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl FieldPolicy {
    /// Policy whose only candidate for each field is the field's own name.
    ///
    /// Normalizing a canonical record with this policy returns it unchanged.
    pub fn canonical() -> Self {
        let own = |f: CanonicalField| vec![f.as_str().to_string()];
        Self {
            name: own(CanonicalField::Name),
            street_number: Vec::new(),
            street_address: own(CanonicalField::StreetAddress),
            extended_address: own(CanonicalField::ExtendedAddress),
            locality: own(CanonicalField::Locality),
            region: RegionPolicy {
                state: own(CanonicalField::Region),
                county: own(CanonicalField::Region),
            },
            country_name: own(CanonicalField::CountryName),
            country_code: own(CanonicalField::CountryCode),
            postal_code: own(CanonicalField::PostalCode),
            display_name: own(CanonicalField::DisplayName),
            latitude: own(CanonicalField::Latitude),
            longitude: own(CanonicalField::Longitude),
            required: Vec::new(),
        }
    }

    /// Parse a policy from TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Replace the locality cascade.
    pub fn with_locality(mut self, candidates: &[&str]) -> Self {
        self.locality = keys(candidates);
        self
    }

    /// Mark a field as required.
    pub fn require(mut self, field: CanonicalField) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }
}

/// A named provider policy as stored in `policies/*.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPolicy {
    /// Identifier used to select the policy, e.g. `"nominatim"`.
    pub id: String,
    /// Human-readable provider name.
    pub label: String,
    #[serde(flatten)]
    pub policy: FieldPolicy,
}

const POLICY_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../../policies/nominatim.toml")),
    ("bing", include_str!("../../policies/bing.toml")),
    ("mapquest", include_str!("../../policies/mapquest.toml")),
    ("geonames", include_str!("../../policies/geonames.toml")),
];

/// All built-in provider policies.
///
/// # Panics
///
/// Panics if an embedded TOML file is malformed; they are fixed at compile
/// time and covered by tests.
pub fn builtin_policies() -> Vec<ProviderPolicy> {
    POLICY_TOMLS
        .iter()
        .map(|(id, text)| {
            toml::from_str(text).unwrap_or_else(|e| panic!("Failed to parse provider policy '{id}': {e}"))
        })
        .collect()
}

/// Look up a built-in provider policy by id (case-insensitive).
///
/// `"canonical"` returns [`FieldPolicy::canonical`].
pub fn builtin_policy(id: &str) -> Option<FieldPolicy> {
    let id = id.to_lowercase();
    if id == "canonical" {
        return Some(FieldPolicy::canonical());
    }
    builtin_policies().into_iter().find(|p| p.id == id).map(|p| p.policy)
}
