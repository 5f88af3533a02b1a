//! Address normalization.
//!
//! Reverse-geocoding providers return the same information under different
//! keys. This module maps any provider's record onto one canonical schema
//! using a declarative per-provider [`FieldPolicy`].

pub mod country;
pub mod normalizer;
pub mod policy;
pub mod types;

pub use country::{BuiltinCountries, CountryLookup};
pub use normalizer::{normalize, AddressNormalizer};
pub use policy::{builtin_policies, builtin_policy, FieldPolicy, ProviderPolicy, RegionPolicy};
pub use types::{CanonicalAddress, CanonicalField, RawAddress};
