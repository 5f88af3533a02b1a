//! Raw provider record → [`CanonicalAddress`].
//!
//! Every field runs through the same first-present cascade over the
//! policy's candidate keys. The only provider-independent rules are:
//!
//! - the country code is upper-cased and kept only when it is two letters
//! - the region prefers state over county in the US, county elsewhere
//! - the country name can be backfilled from the code via [`CountryLookup`]
//! - `display_name` is rebuilt from the components that were found

use super::country::CountryLookup;
use super::policy::FieldPolicy;
use super::types::{CanonicalAddress, CanonicalField, RawAddress};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use tracing::{debug, trace};

const DISPLAY_SEPARATOR: &str = ", ";

/// First candidate key with a meaningful text value.
fn first_present(raw: &RawAddress, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|key| raw.text(key))
}

fn first_number(raw: &RawAddress, candidates: &[String]) -> Option<f64> {
    candidates.iter().find_map(|key| raw.number(key))
}

/// Upper-case `code` if it is an ISO 3166-1 alpha-2 shape.
fn alpha2(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

/// Join populated components in display order.
fn compose_display_name(addr: &CanonicalAddress) -> Option<String> {
    let parts: Vec<&str> = CanonicalField::DISPLAY_ORDER
        .iter()
        .filter_map(|f| addr.get(*f))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(DISPLAY_SEPARATOR))
    }
}

/// Applies [`FieldPolicy`] cascades, optionally with a country lookup.
#[derive(Clone, Copy, Default)]
pub struct AddressNormalizer<'a> {
    countries: Option<&'a dyn CountryLookup>,
}

impl<'a> AddressNormalizer<'a> {
    /// Normalizer without country-name backfill.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country_lookup(mut self, lookup: &'a dyn CountryLookup) -> Self {
        self.countries = Some(lookup);
        self
    }

    /// Normalize a record that carries its own coordinates.
    pub fn normalize(&self, raw: &RawAddress, policy: &FieldPolicy) -> Result<CanonicalAddress> {
        self.normalize_with(raw, policy, None)
    }

    /// Normalize a reverse-geocode response for `query`. The query's
    /// coordinates stand in when the response omits its own.
    pub fn normalize_at(&self, raw: &RawAddress, policy: &FieldPolicy, query: &Coordinate) -> Result<CanonicalAddress> {
        self.normalize_with(raw, policy, Some(query))
    }

    fn normalize_with(
        &self,
        raw: &RawAddress,
        policy: &FieldPolicy,
        query: Option<&Coordinate>,
    ) -> Result<CanonicalAddress> {
        let mut addr = CanonicalAddress {
            name: first_present(raw, &policy.name),
            street_address: self.street(raw, policy),
            extended_address: first_present(raw, &policy.extended_address),
            locality: first_present(raw, &policy.locality),
            country_name: first_present(raw, &policy.country_name),
            postal_code: first_present(raw, &policy.postal_code),
            ..Default::default()
        };

        addr.country_code = self.country_code(raw, policy, addr.country_name.as_deref());
        addr.region = region(raw, policy, addr.country_code.as_deref());

        if addr.country_name.is_none() {
            if let (Some(code), Some(lookup)) = (addr.country_code.as_deref(), self.countries) {
                addr.country_name = lookup.country_name(code);
                if addr.country_name.is_none() {
                    debug!(code, "country lookup has no name for code");
                }
            }
        }

        let point = coordinate(raw, policy, query)?;
        addr.latitude = point.latitude();
        addr.longitude = point.longitude();

        addr.display_name = compose_display_name(&addr).or_else(|| first_present(raw, &policy.display_name));

        for field in &policy.required {
            if addr.has(*field) {
                continue;
            }
            return Err(match (field, &addr.country_code) {
                (CanonicalField::CountryName, Some(code)) => Error::UnresolvableCountry(code.clone()),
                _ => Error::MissingRequiredField(*field),
            });
        }

        trace!(
            locality = addr.locality.as_deref().unwrap_or("-"),
            region = addr.region.as_deref().unwrap_or("-"),
            country = addr.country_code.as_deref().unwrap_or("-"),
            "address normalized"
        );
        Ok(addr)
    }

    /// Street line, with the house number prefixed when both are present.
    fn street(&self, raw: &RawAddress, policy: &FieldPolicy) -> Option<String> {
        let street = first_present(raw, &policy.street_address)?;
        match first_present(raw, &policy.street_number) {
            Some(number) => Some(format!("{number} {street}")),
            None => Some(street),
        }
    }

    fn country_code(&self, raw: &RawAddress, policy: &FieldPolicy, country_name: Option<&str>) -> Option<String> {
        if let Some(value) = first_present(raw, &policy.country_code) {
            match alpha2(&value) {
                Some(code) => return Some(code),
                None => debug!(value = value.as_str(), "dropping malformed country code"),
            }
        }
        let name = country_name?;
        let code = self.countries?.country_code(name).and_then(|c| alpha2(&c));
        if code.is_some() {
            trace!(country = name, "country code backfilled from name");
        }
        code
    }
}

/// `US` records prefer state over county; everything else prefers county.
fn region(raw: &RawAddress, policy: &FieldPolicy, country_code: Option<&str>) -> Option<String> {
    let (first, second) = if country_code == Some("US") {
        (&policy.region.state, &policy.region.county)
    } else {
        (&policy.region.county, &policy.region.state)
    };
    first_present(raw, first).or_else(|| first_present(raw, second))
}

fn coordinate(raw: &RawAddress, policy: &FieldPolicy, query: Option<&Coordinate>) -> Result<Coordinate> {
    let lat = first_number(raw, &policy.latitude).or(query.map(|q| q.latitude()));
    let lon = first_number(raw, &policy.longitude).or(query.map(|q| q.longitude()));
    match (lat, lon) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
        (None, _) => Err(Error::MissingRequiredField(CanonicalField::Latitude)),
        (_, None) => Err(Error::MissingRequiredField(CanonicalField::Longitude)),
    }
}

/// Normalize `raw` under `policy` without a country lookup.
pub fn normalize(raw: &RawAddress, policy: &FieldPolicy) -> Result<CanonicalAddress> {
    AddressNormalizer::new().normalize(raw, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{builtin_policy, BuiltinCountries};
    use proptest::prelude::*;
    use serde_json::json;

    fn flat_policy() -> FieldPolicy {
        let k = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        FieldPolicy {
            name: k(&["name"]),
            street_number: k(&["house_number"]),
            street_address: k(&["road", "street"]),
            extended_address: k(&["suburb"]),
            locality: k(&["village", "town", "city"]),
            region: crate::address::RegionPolicy { state: k(&["state"]), county: k(&["county"]) },
            country_name: k(&["country"]),
            country_code: k(&["country_code"]),
            postal_code: k(&["postcode"]),
            display_name: k(&["display_name"]),
            latitude: k(&["lat"]),
            longitude: k(&["lon"]),
            required: Vec::new(),
        }
    }

    #[test]
    fn test_us_region_prefers_state() {
        let raw = RawAddress::new()
            .with("city", "Springfield")
            .with("county", "Sangamon County")
            .with("state", "IL")
            .with("country_code", "us");
        let query = Coordinate::new(39.7817, -89.6501).unwrap();
        let addr = AddressNormalizer::new().normalize_at(&raw, &flat_policy(), &query).unwrap();
        assert_eq!(addr.region.as_deref(), Some("IL"));
        assert_eq!(addr.country_code.as_deref(), Some("US"));
        assert_eq!(addr.latitude, 39.7817);
        assert_eq!(addr.longitude, -89.6501);
    }

    #[test]
    fn test_non_us_region_prefers_county() {
        let raw = RawAddress::new()
            .with("town", "Stratford-upon-Avon")
            .with("county", "Warwickshire")
            .with("state", "England")
            .with("country_code", "GB")
            .with("lat", 52.19)
            .with("lon", -1.71);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.region.as_deref(), Some("Warwickshire"));
    }

    #[test]
    fn test_region_falls_back_to_other_level() {
        let raw = RawAddress::new().with("state", "Bavaria").with("country_code", "DE").with("lat", 48.1).with("lon", 11.6);
        assert_eq!(normalize(&raw, &flat_policy()).unwrap().region.as_deref(), Some("Bavaria"));
    }

    #[test]
    fn test_locality_cascade_order() {
        let raw = RawAddress::new().with("city", "Big City").with("village", "Small Village").with("lat", 1.0).with("lon", 1.0);
        assert_eq!(normalize(&raw, &flat_policy()).unwrap().locality.as_deref(), Some("Small Village"));

        let raw = RawAddress::new().with("city", "Big City").with("village", "  ").with("lat", 1.0).with("lon", 1.0);
        assert_eq!(normalize(&raw, &flat_policy()).unwrap().locality.as_deref(), Some("Big City"));
    }

    #[test]
    fn test_street_number_prefix() {
        let raw = RawAddress::new()
            .with("house_number", "221B")
            .with("road", "Baker Street")
            .with("lat", 51.5238)
            .with("lon", -0.1586);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.street_address.as_deref(), Some("221B Baker Street"));

        let raw = RawAddress::new().with("house_number", "12").with("lat", 0.0).with("lon", 0.0);
        assert_eq!(normalize(&raw, &flat_policy()).unwrap().street_address, None);
    }

    #[test]
    fn test_malformed_country_code_dropped() {
        let raw = RawAddress::new().with("country_code", "USA").with("state", "Ohio").with("county", "Franklin").with("lat", 40.0).with("lon", -83.0);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.country_code, None);
        // unknown country → county-first
        assert_eq!(addr.region.as_deref(), Some("Franklin"));
    }

    #[test]
    fn test_country_name_backfill() {
        let raw = RawAddress::new().with("city", "Oslo").with("country_code", "no").with("lat", 59.91).with("lon", 10.75);
        let lookup = BuiltinCountries;
        let addr = AddressNormalizer::new().with_country_lookup(&lookup).normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.country_name.as_deref(), Some("Norway"));
        assert_eq!(addr.display_name.as_deref(), Some("Oslo, Norway"));

        let plain = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(plain.country_name, None);
    }

    #[test]
    fn test_country_code_backfill_selects_us_branch() {
        let raw = RawAddress::new()
            .with("country", "United States")
            .with("state", "Illinois")
            .with("county", "Sangamon County")
            .with("lat", 39.78)
            .with("lon", -89.65);
        let lookup = BuiltinCountries;
        let addr = AddressNormalizer::new().with_country_lookup(&lookup).normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.country_code.as_deref(), Some("US"));
        assert_eq!(addr.region.as_deref(), Some("Illinois"));
    }

    #[test]
    fn test_display_name_joins_components() {
        let raw = RawAddress::new()
            .with("name", "Eiffel Tower")
            .with("road", "Avenue Anatole France")
            .with("city", "Paris")
            .with("state", "Île-de-France")
            .with("country", "France")
            .with("display_name", "provider's own label")
            .with("lat", 48.8584)
            .with("lon", 2.2945);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(
            addr.display_name.as_deref(),
            Some("Eiffel Tower, Avenue Anatole France, Paris, Île-de-France, France")
        );
    }

    #[test]
    fn test_display_name_from_provider_when_no_components() {
        let raw = RawAddress::new().with("display_name", "Somewhere at sea").with("lat", 10.0).with("lon", -30.0);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.display_name.as_deref(), Some("Somewhere at sea"));
    }

    #[test]
    fn test_zero_coordinates_retained() {
        let raw = RawAddress::new().with("lat", 0.0).with("lon", 0.0);
        let addr = normalize(&raw, &flat_policy()).unwrap();
        assert_eq!(addr.latitude, 0.0);
        assert_eq!(addr.longitude, 0.0);
        assert_eq!(addr.display_name, None);
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json, json!({"latitude": 0.0, "longitude": 0.0}));
    }

    #[test]
    fn test_missing_coordinates() {
        let raw = RawAddress::new().with("city", "Nowhere").with("lon", 3.0);
        assert!(matches!(
            normalize(&raw, &flat_policy()),
            Err(Error::MissingRequiredField(CanonicalField::Latitude))
        ));
        let raw = RawAddress::new().with("lat", 95.0).with("lon", 3.0);
        assert!(matches!(normalize(&raw, &flat_policy()), Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_required_fields() {
        let policy = flat_policy().require(CanonicalField::Locality);
        let raw = RawAddress::new().with("road", "Main St").with("lat", 1.0).with("lon", 1.0);
        assert!(matches!(
            normalize(&raw, &policy),
            Err(Error::MissingRequiredField(CanonicalField::Locality))
        ));
    }

    #[test]
    fn test_unresolvable_country() {
        let policy = flat_policy().require(CanonicalField::CountryName);
        let lookup = BuiltinCountries;
        let normalizer = AddressNormalizer::new().with_country_lookup(&lookup);

        let raw = RawAddress::new().with("country_code", "XQ").with("lat", 1.0).with("lon", 1.0);
        match normalizer.normalize(&raw, &policy) {
            Err(Error::UnresolvableCountry(code)) => assert_eq!(code, "XQ"),
            other => panic!("unexpected {:?}", other),
        }

        let raw = RawAddress::new().with("lat", 1.0).with("lon", 1.0);
        assert!(matches!(
            normalizer.normalize(&raw, &policy),
            Err(Error::MissingRequiredField(CanonicalField::CountryName))
        ));
    }

    #[test]
    fn test_nominatim_document() {
        let doc = json!({
            "place_id": 1234,
            "lat": "51.5237629",
            "lon": "-0.1584743",
            "display_name": "221B, Baker Street, Marylebone, London, Greater London, England, NW1 6XE, United Kingdom",
            "address": {
                "house_number": "221B",
                "road": "Baker Street",
                "suburb": "Marylebone",
                "city": "London",
                "state_district": "Greater London",
                "state": "England",
                "postcode": "NW1 6XE",
                "country": "United Kingdom",
                "country_code": "gb"
            }
        });
        let policy = builtin_policy("nominatim").unwrap();
        let addr = normalize(&RawAddress::from_json(doc), &policy).unwrap();
        assert_eq!(addr.street_address.as_deref(), Some("221B Baker Street"));
        assert_eq!(addr.extended_address.as_deref(), Some("Marylebone"));
        assert_eq!(addr.locality.as_deref(), Some("London"));
        assert_eq!(addr.region.as_deref(), Some("Greater London"));
        assert_eq!(addr.country_code.as_deref(), Some("GB"));
        assert_eq!(addr.postal_code.as_deref(), Some("NW1 6XE"));
        assert_eq!(addr.latitude, 51.5237629);
        assert_eq!(
            addr.display_name.as_deref(),
            Some("221B Baker Street, Marylebone, London, Greater London, United Kingdom")
        );
    }

    #[test]
    fn test_nominatim_road_result_does_not_repeat_street() {
        let doc = json!({
            "lat": "51.5225",
            "lon": "-0.1571",
            "name": "Baker Street",
            "address": {
                "road": "Baker Street",
                "suburb": "Marylebone",
                "city": "London",
                "country": "United Kingdom",
                "country_code": "gb"
            }
        });
        let addr = normalize(&RawAddress::from_json(doc), &builtin_policy("nominatim").unwrap()).unwrap();
        assert_eq!(addr.name, None);
        assert_eq!(addr.display_name.as_deref(), Some("Baker Street, Marylebone, London, United Kingdom"));
    }

    #[test]
    fn test_nominatim_poi_name() {
        let doc = json!({
            "lat": "51.5238",
            "lon": "-0.1586",
            "name": "Sherlock Holmes Museum",
            "address": {
                "tourism": "Sherlock Holmes Museum",
                "road": "Baker Street",
                "city": "London",
                "country_code": "gb"
            }
        });
        let addr = normalize(&RawAddress::from_json(doc), &builtin_policy("nominatim").unwrap()).unwrap();
        assert_eq!(addr.name.as_deref(), Some("Sherlock Holmes Museum"));
        assert_eq!(addr.display_name.as_deref(), Some("Sherlock Holmes Museum, Baker Street, London"));
    }

    #[test]
    fn test_geonames_place_name_is_locality_only() {
        let doc = json!({
            "name": "Uppsala",
            "placename": "Uppsala",
            "adminName1": "Uppsala län",
            "countryCode": "SE",
            "countryName": "Sweden",
            "lat": "59.85882",
            "lng": "17.63889"
        });
        let addr = normalize(&RawAddress::from_json(doc), &builtin_policy("geonames").unwrap()).unwrap();
        assert_eq!(addr.name, None);
        assert_eq!(addr.locality.as_deref(), Some("Uppsala"));
        assert_eq!(addr.display_name.as_deref(), Some("Uppsala, Uppsala län, Sweden"));
    }

    #[test]
    fn test_bing_document() {
        let doc = json!({
            "name": "1 Microsoft Way, Redmond, WA 98052",
            "point": { "type": "Point", "coordinates": [47.64, -122.13] },
            "address": {
                "addressLine": "1 Microsoft Way",
                "adminDistrict": "WA",
                "adminDistrict2": "King County",
                "countryRegion": "United States",
                "countryRegionIso2": "US",
                "formattedAddress": "1 Microsoft Way, Redmond, WA 98052",
                "locality": "Redmond",
                "postalCode": "98052"
            }
        });
        let policy = builtin_policy("bing").unwrap();
        let addr = normalize(&RawAddress::from_json(doc), &policy).unwrap();
        assert_eq!(addr.region.as_deref(), Some("WA"));
        assert_eq!(addr.latitude, 47.64);
        assert_eq!(addr.longitude, -122.13);
    }

    #[test]
    fn test_canonical_policy_is_identity() {
        let raw = RawAddress::new()
            .with("name", "Town Hall")
            .with("road", "High Street")
            .with("town", "Ely")
            .with("county", "Cambridgeshire")
            .with("country", "United Kingdom")
            .with("country_code", "gb")
            .with("postcode", "CB7 4LQ")
            .with("lat", 52.3987)
            .with("lon", 0.2625);
        let first = normalize(&raw, &flat_policy()).unwrap();
        let second = normalize(&first.to_raw(), &FieldPolicy::canonical()).unwrap();
        assert_eq!(first, second);
    }

    fn component() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            "[A-Za-z][A-Za-z ]{0,12}",
        ])
    }

    proptest! {
        #[test]
        fn prop_display_name_separators(
            name in component(),
            road in component(),
            suburb in component(),
            city in component(),
            county in component(),
            country in component(),
            code in prop::option::of("[A-Za-z]{1,3}"),
        ) {
            let mut raw = RawAddress::new().with("lat", 12.5).with("lon", -7.25);
            for (key, value) in [("name", name), ("road", road), ("suburb", suburb), ("city", city), ("county", county), ("country", country), ("country_code", code)] {
                if let Some(v) = value {
                    raw.insert(key, v);
                }
            }
            let addr = normalize(&raw, &flat_policy()).unwrap();
            if let Some(display) = addr.display_name.as_deref() {
                prop_assert!(!display.starts_with(", "));
                prop_assert!(!display.ends_with(", "));
                prop_assert!(!display.contains(", , "));
                for part in display.split(DISPLAY_SEPARATOR) {
                    prop_assert!(!part.trim().is_empty(), "empty part in {:?}", display);
                }
            }
            let again = normalize(&addr.to_raw(), &FieldPolicy::canonical()).unwrap();
            prop_assert_eq!(again, addr);
        }
    }
}
