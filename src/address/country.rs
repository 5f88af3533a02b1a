//! Country code ↔ name lookup.
//!
//! The normalizer only needs a way to turn an ISO 3166-1 alpha-2 code into a
//! display name (and optionally back). Callers with a full dataset plug in
//! their own [`CountryLookup`]; [`BuiltinCountries`] covers the common cases.

/// Resolves country names from alpha-2 codes.
pub trait CountryLookup: Send + Sync {
    /// English display name for an upper-case alpha-2 code.
    fn country_name(&self, code: &str) -> Option<String>;

    /// Alpha-2 code for a country name, if the lookup supports reverse
    /// resolution.
    fn country_code(&self, _name: &str) -> Option<String> {
        None
    }
}

// ─── Built-in Table ─────────────────────────────────────────────────────────

/// Alpha-2 code and English short name.
const COUNTRIES: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AF", "Afghanistan"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("AZ", "Azerbaijan"),
    ("BD", "Bangladesh"),
    ("BE", "Belgium"),
    ("BH", "Bahrain"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("DZ", "Algeria"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("ET", "Ethiopia"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GE", "Georgia"),
    ("GH", "Ghana"),
    ("GR", "Greece"),
    ("HK", "Hong Kong"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IN", "India"),
    ("IQ", "Iraq"),
    ("IR", "Iran"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("JO", "Jordan"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KR", "South Korea"),
    ("KW", "Kuwait"),
    ("KZ", "Kazakhstan"),
    ("LB", "Lebanon"),
    ("LK", "Sri Lanka"),
    ("MA", "Morocco"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("NG", "Nigeria"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NP", "Nepal"),
    ("NZ", "New Zealand"),
    ("OM", "Oman"),
    ("PE", "Peru"),
    ("PH", "Philippines"),
    ("PK", "Pakistan"),
    ("PL", "Poland"),
    ("PS", "Palestine"),
    ("PT", "Portugal"),
    ("QA", "Qatar"),
    ("RO", "Romania"),
    ("RU", "Russia"),
    ("SA", "Saudi Arabia"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("SY", "Syria"),
    ("TH", "Thailand"),
    ("TN", "Tunisia"),
    ("TR", "Türkiye"),
    ("TW", "Taiwan"),
    ("TZ", "Tanzania"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("UZ", "Uzbekistan"),
    ("VE", "Venezuela"),
    ("VN", "Vietnam"),
    ("YE", "Yemen"),
    ("ZA", "South Africa"),
];

/// Alternate spellings accepted by reverse lookup, lower case.
fn alias_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "united states of america" | "usa" => "US",
        "uk" | "great britain" | "england" | "scotland" | "wales" => "GB",
        "deutschland" => "DE",
        "italia" => "IT",
        "españa" => "ES",
        "russian federation" => "RU",
        "people's republic of china" => "CN",
        "turkey" => "TR",
        "czech republic" | "česko" => "CZ",
        "korea, republic of" | "republic of korea" => "KR",
        "viet nam" => "VN",
        "syrian arab republic" => "SY",
        "palestinian territory" => "PS",
        "uae" => "AE",
        "méxico" => "MX",
        "brasil" => "BR",
        "perú" => "PE",
        "sverige" => "SE",
        "norge" => "NO",
        "danmark" => "DK",
        "suomi" => "FI",
        "ísland" => "IS",
        "nederland" | "the netherlands" => "NL",
        "belgique" | "belgië" => "BE",
        "schweiz" | "suisse" => "CH",
        "österreich" => "AT",
        "polska" => "PL",
        "aotearoa" => "NZ",
        "maroc" => "MA",
        _ => return None,
    };
    Some(code)
}

/// Embedded table of about eighty widely used countries.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCountries;

impl CountryLookup for BuiltinCountries {
    fn country_name(&self, code: &str) -> Option<String> {
        COUNTRIES
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, name)| name.to_string())
    }

    fn country_code(&self, name: &str) -> Option<String> {
        let n = name.trim().to_lowercase();
        COUNTRIES
            .iter()
            .find(|(_, known)| known.to_lowercase() == n)
            .map(|(code, _)| *code)
            .or_else(|| alias_code(&n))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_to_name() {
        assert_eq!(BuiltinCountries.country_name("US").as_deref(), Some("United States"));
        assert_eq!(BuiltinCountries.country_name("gb").as_deref(), Some("United Kingdom"));
        assert_eq!(BuiltinCountries.country_name("XX"), None);
    }

    #[test]
    fn test_name_to_code() {
        assert_eq!(BuiltinCountries.country_code("Sweden").as_deref(), Some("SE"));
        assert_eq!(BuiltinCountries.country_code(" united kingdom ").as_deref(), Some("GB"));
        assert_eq!(BuiltinCountries.country_code("Deutschland").as_deref(), Some("DE"));
        assert_eq!(BuiltinCountries.country_code("Atlantis"), None);
    }

    #[test]
    fn test_table_codes_are_unique_and_upper_case() {
        let mut codes: Vec<&str> = COUNTRIES.iter().map(|(c, _)| *c).collect();
        assert!(codes.iter().all(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_uppercase())));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), COUNTRIES.len());
    }

    #[test]
    fn test_aliases_resolve_to_known_codes() {
        for alias in ["usa", "turkey", "viet nam", "uae", "sverige"] {
            let code = BuiltinCountries.country_code(alias).unwrap();
            assert!(BuiltinCountries.country_name(&code).is_some(), "{alias} → {code}");
        }
    }
}
