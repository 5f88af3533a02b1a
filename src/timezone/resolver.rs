//! Coordinate → IANA zone resolution with DST-aware offsets.

use super::table::{Candidate, ReferenceIndex, TimezoneTable};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use chrono::{DateTime, NaiveDate, Offset, SecondsFormat, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Matches farther than this are treated as "no zone known".
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 200_000.0;

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum distance in meters between the query and a reference point.
    pub search_radius_m: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { search_radius_m: DEFAULT_SEARCH_RADIUS_M }
    }
}

/// A zone evaluated at one instant.
///
/// All fields are computed when the value is built; nothing is looked up
/// lazily afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTimezone {
    #[serde(skip)]
    zone: Tz,
    pub zone_name: String,
    /// Calendar date the offset was evaluated for, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
    /// UTC offset as `±HH:MM`.
    pub offset: String,
    pub offset_seconds: i32,
    /// Zone abbreviation in effect, e.g. `CEST`.
    pub abbreviation: String,
    /// Whether daylight-saving time is in effect.
    pub dst: bool,
    /// ISO-8601 local time of the evaluated instant.
    pub local_time: String,
}

impl ResolvedTimezone {
    /// Evaluate `zone` at `instant`.
    pub fn at(zone: Tz, instant: DateTime<Utc>, reference_date: Option<NaiveDate>) -> Self {
        let local = instant.with_timezone(&zone);
        let tz_offset = local.offset();
        let offset_seconds = tz_offset.fix().local_minus_utc();

        Self {
            zone,
            zone_name: zone.name().to_string(),
            reference_date,
            offset: format_offset(offset_seconds),
            offset_seconds,
            abbreviation: tz_offset.to_string(),
            dst: !tz_offset.dst_offset().is_zero(),
            local_time: local.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }

    /// Evaluate a zone given by name, e.g. a caller-supplied override.
    pub fn for_zone_name(name: &str, instant: DateTime<Utc>) -> Result<Self> {
        let zone: Tz = name.parse().map_err(|_| Error::UnknownZone(name.to_string()))?;
        Ok(Self::at(zone, instant, None))
    }

    /// The `chrono-tz` zone this value was built from.
    pub fn tz(&self) -> Tz {
        self.zone
    }
}

/// `+05:30`, `-04:00`, `+00:00`.
pub fn format_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Noon local time on `date`, as a UTC instant.
///
/// Noon sidesteps the midnight/2 AM transition gaps some zones have.
fn local_noon(zone: Tz, date: NaiveDate) -> DateTime<Utc> {
    let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    match zone.from_local_datetime(&noon).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => noon.and_utc(),
    }
}

/// Nearest-reference timezone resolver.
pub struct TimezoneResolver<'a, I: ReferenceIndex + ?Sized = TimezoneTable> {
    index: &'a I,
    config: ResolverConfig,
}

impl TimezoneResolver<'static, TimezoneTable> {
    /// Resolver over the embedded city table with the default radius.
    pub fn builtin() -> Self {
        Self::new(TimezoneTable::builtin(), ResolverConfig::default())
    }
}

impl<'a, I: ReferenceIndex + ?Sized> TimezoneResolver<'a, I> {
    pub fn new(index: &'a I, config: ResolverConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Closest reference point within the search radius.
    pub fn nearest(&self, point: &Coordinate) -> Result<Candidate<'a>> {
        match self.index.nearest_within(point, self.config.search_radius_m) {
            Some(hit) => {
                trace!(
                    place = hit.reference.place.as_deref().unwrap_or("-"),
                    zone = hit.reference.zone_name(),
                    distance_m = hit.distance_m,
                    "timezone reference matched"
                );
                Ok(hit)
            }
            None => {
                debug!(
                    lat = point.latitude(),
                    lon = point.longitude(),
                    radius_m = self.config.search_radius_m,
                    "no timezone reference in range"
                );
                Err(Error::TimezoneNotFound {
                    latitude: point.latitude(),
                    longitude: point.longitude(),
                    radius_km: self.config.search_radius_m / 1000.0,
                })
            }
        }
    }

    /// Zone in effect at `point`.
    pub fn zone_for(&self, point: &Coordinate) -> Result<Tz> {
        Ok(self.nearest(point)?.reference.zone)
    }

    /// Resolve `point` and evaluate its zone at local noon of `as_of`, or
    /// at the current instant when no date is given.
    pub fn resolve(&self, point: &Coordinate, as_of: Option<NaiveDate>) -> Result<ResolvedTimezone> {
        let zone = self.zone_for(point)?;
        let instant = match as_of {
            Some(date) => local_noon(zone, date),
            None => Utc::now(),
        };
        Ok(ResolvedTimezone::at(zone, instant, as_of))
    }

    /// Resolve `point` and evaluate its zone at an exact instant.
    pub fn resolve_at(&self, point: &Coordinate, instant: DateTime<Utc>) -> Result<ResolvedTimezone> {
        let zone = self.zone_for(point)?;
        Ok(ResolvedTimezone::at(zone, instant, Some(instant.with_timezone(&zone).date_naive())))
    }
}
