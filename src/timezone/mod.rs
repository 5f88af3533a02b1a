//! Timezone resolution from coordinates.
//!
//! A static table of reference cities is scanned for the closest point
//! inside a search radius; the matched IANA zone is then evaluated with
//! full DST rules via `chrono-tz`.

pub mod resolver;
pub mod table;

pub use resolver::{format_offset, ResolvedTimezone, ResolverConfig, TimezoneResolver, DEFAULT_SEARCH_RADIUS_M};
pub use table::{Candidate, ReferenceIndex, TimezoneReference, TimezoneTable};
