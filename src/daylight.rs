//! Sunrise, sunset, and day/night classification.
//!
//! Core rule: never fake a physical event. If the sun does not cross the
//! adjusted horizon on a date, the event is reported as a polar condition
//! instead of a made-up time.
//!
//! Events use the sunrise equation with a zenith of 90.8333° (refraction
//! plus the solar semi-diameter), widened by `0.0347·√h` degrees for an
//! observer `h` meters above the surrounding terrain.

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::solar::{self, hour_angle, julian_century, julian_day};
use crate::timezone::{ReferenceIndex, ResolvedTimezone, TimezoneResolver, TimezoneTable};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::solar::PolarCondition;

/// Zenith of the sun's center at sunrise/sunset for a sea-level observer.
pub const BASE_ZENITH: f64 = 90.8333;

/// Horizon dip in degrees per √meter of observer elevation.
pub const ELEVATION_DIP_COEFFICIENT: f64 = 0.0347;

/// Passes of the sunrise equation; each re-evaluates declination and the
/// equation of time at the previous estimate.
const REFINEMENT_PASSES: usize = 3;

/// Which horizon crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolarEventKind {
    Sunrise,
    Sunset,
}

impl std::fmt::Display for SolarEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolarEventKind::Sunrise => write!(f, "sunrise"),
            SolarEventKind::Sunset => write!(f, "sunset"),
        }
    }
}

/// A sunrise or sunset with both its absolute instant and local time.
#[derive(Debug, Clone, Serialize)]
pub struct SolarEvent {
    pub kind: SolarEventKind,
    pub instant: DateTime<Utc>,
    pub timezone: ResolvedTimezone,
}

impl SolarEvent {
    /// ISO-8601 local time of the event.
    pub fn local_time(&self) -> &str {
        &self.timezone.local_time
    }

    pub fn local(&self) -> DateTime<Tz> {
        self.instant.with_timezone(&self.timezone.tz())
    }
}

/// Both events of one date, in UTC.
#[derive(Debug, Clone, Serialize)]
pub struct SolarDay {
    pub date: NaiveDate,
    /// Zenith angle the events were computed for, degrees.
    pub zenith: f64,
    pub solar_noon: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Set when at least one event does not occur.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<PolarCondition>,
    pub day_length_seconds: i64,
}

/// Zenith angle for an observer at `elevation` meters.
///
/// Only positive elevations widen the horizon.
pub fn zenith_for(elevation: Option<f64>) -> f64 {
    match elevation {
        Some(h) if h > 0.0 => BASE_ZENITH + ELEVATION_DIP_COEFFICIENT * h.sqrt(),
        _ => BASE_ZENITH,
    }
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn minutes_to_instant(date: NaiveDate, minutes: f64) -> DateTime<Utc> {
    utc_midnight(date) + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Solar noon as UTC minutes after midnight of `date`.
fn solar_noon_minutes(date: NaiveDate, lon: f64) -> f64 {
    let jd0 = julian_day(date);
    let mut minutes = 720.0 - 4.0 * lon;
    for _ in 0..REFINEMENT_PASSES {
        let t = julian_century(jd0 + minutes / 1440.0);
        minutes = 720.0 - 4.0 * lon - solar::equation_of_time(t);
    }
    minutes
}

/// Event time as UTC minutes after midnight of `date`.
///
/// May be negative or exceed 1440 for longitudes far from Greenwich; the
/// event still belongs to the local day of `date`.
fn event_minutes(
    date: NaiveDate,
    lat: f64,
    lon: f64,
    zenith: f64,
    kind: SolarEventKind,
) -> std::result::Result<f64, PolarCondition> {
    let jd0 = julian_day(date);
    let mut minutes = 720.0 - 4.0 * lon;
    for _ in 0..REFINEMENT_PASSES {
        let t = julian_century(jd0 + minutes / 1440.0);
        let declination = solar::solar_declination(t);
        let eqt = solar::equation_of_time(t);
        let ha = hour_angle(lat, declination, zenith)?;
        let signed = match kind {
            SolarEventKind::Sunrise => ha,
            SolarEventKind::Sunset => -ha,
        };
        minutes = 720.0 - 4.0 * (lon + signed) - eqt;
    }
    Ok(minutes)
}

/// UTC instant of `kind` at `point` on `date`.
pub fn event_instant(point: &Coordinate, date: NaiveDate, kind: SolarEventKind) -> Result<DateTime<Utc>> {
    let zenith = zenith_for(point.elevation());
    match event_minutes(date, point.latitude(), point.longitude(), zenith, kind) {
        Ok(minutes) => Ok(minutes_to_instant(date, minutes)),
        Err(condition) => {
            debug!(%date, %kind, %condition, lat = point.latitude(), "solar event does not occur");
            Err(Error::NoSolarEvent { kind, date, condition })
        }
    }
}

/// Sunrise, sunset, and solar noon for `point` on `date`.
pub fn solar_day(point: &Coordinate, date: NaiveDate) -> SolarDay {
    let zenith = zenith_for(point.elevation());
    let (lat, lon) = (point.latitude(), point.longitude());

    let rise = event_minutes(date, lat, lon, zenith, SolarEventKind::Sunrise);
    let set = event_minutes(date, lat, lon, zenith, SolarEventKind::Sunset);
    let condition = rise.err().or(set.err());

    let sunrise = rise.ok().map(|m| minutes_to_instant(date, m));
    let sunset = set.ok().map(|m| minutes_to_instant(date, m));

    let day_length_seconds = match (sunrise, sunset) {
        (Some(r), Some(s)) => (s - r).num_seconds(),
        _ if condition == Some(PolarCondition::PolarDay) => 86_400,
        _ => 0,
    };

    SolarDay {
        date,
        zenith,
        solar_noon: minutes_to_instant(date, solar_noon_minutes(date, lon)),
        sunrise,
        sunset,
        condition,
        day_length_seconds,
    }
}

/// Calendar date of `instant` in local mean solar time at `point`.
///
/// This is the date whose sunrise and sunset bracket the instant, which a
/// plain UTC date does not guarantee far from Greenwich.
pub fn solar_date(point: &Coordinate, instant: DateTime<Utc>) -> NaiveDate {
    let shift = Duration::seconds((point.longitude() * 240.0).round() as i64);
    (instant + shift).date_naive()
}

/// Whether the sun is up at `instant`: strictly after that date's sunrise
/// and strictly before its sunset.
pub fn is_daytime(point: &Coordinate, instant: DateTime<Utc>) -> bool {
    let day = solar_day(point, solar_date(point, instant));
    match (day.sunrise, day.sunset) {
        (Some(rise), Some(set)) => rise < instant && instant < set,
        (Some(rise), None) => rise < instant,
        (None, Some(set)) => instant < set,
        (None, None) => day.condition == Some(PolarCondition::PolarDay),
    }
}

/// Solar events with timezone attachment.
pub struct SolarCalculator<'a, I: ReferenceIndex + ?Sized = TimezoneTable> {
    resolver: TimezoneResolver<'a, I>,
}

impl SolarCalculator<'static, TimezoneTable> {
    /// Calculator backed by the built-in timezone table.
    pub fn builtin() -> Self {
        Self::new(TimezoneResolver::builtin())
    }
}

impl<'a, I: ReferenceIndex + ?Sized> SolarCalculator<'a, I> {
    pub fn new(resolver: TimezoneResolver<'a, I>) -> Self {
        Self { resolver }
    }

    /// `kind` at `point` on `date`, with the point's own timezone attached.
    pub fn event(&self, point: &Coordinate, date: NaiveDate, kind: SolarEventKind) -> Result<SolarEvent> {
        let instant = event_instant(point, date, kind)?;
        let timezone = self.resolver.resolve_at(point, instant)?;
        Ok(SolarEvent { kind, instant, timezone })
    }

    /// Like [`event`](Self::event) but with a caller-chosen zone.
    pub fn event_in_zone(
        &self,
        point: &Coordinate,
        date: NaiveDate,
        kind: SolarEventKind,
        zone: Tz,
    ) -> Result<SolarEvent> {
        let instant = event_instant(point, date, kind)?;
        let timezone = ResolvedTimezone::at(zone, instant, Some(instant.with_timezone(&zone).date_naive()));
        Ok(SolarEvent { kind, instant, timezone })
    }

    /// UTC instant only; needs no timezone reference nearby.
    pub fn instant(&self, point: &Coordinate, date: NaiveDate, kind: SolarEventKind) -> Result<DateTime<Utc>> {
        event_instant(point, date, kind)
    }

    pub fn day(&self, point: &Coordinate, date: NaiveDate) -> SolarDay {
        solar_day(point, date)
    }

    pub fn is_daytime(&self, point: &Coordinate, instant: DateTime<Utc>) -> bool {
        is_daytime(point, instant)
    }
}
