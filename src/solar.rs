//! Solar ephemeris: NOAA/Meeus low-precision formulas.
//!
//! Provides the declination and equation of time needed by the sunrise
//! equation, plus altitude/azimuth for an arbitrary instant.
//! Accuracy: ~0.01° for dates within ±50 years of J2000.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Julian Date of J2000.0.
const J2000: f64 = 2_451_545.0;

/// Solar position at a specific instant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SolarPosition {
    /// Geometric altitude above the horizon, degrees.
    pub altitude: f64,
    /// Azimuth clockwise from north, degrees.
    pub azimuth: f64,
    pub declination: f64,
    /// Equation of time, minutes.
    pub equation_of_time: f64,
}

/// Julian Date at 00:00 UTC of a calendar date.
pub fn julian_day(date: NaiveDate) -> f64 {
    let (y, m) = if date.month() <= 2 {
        (date.year() as f64 - 1.0, date.month() as f64 + 12.0)
    } else {
        (date.year() as f64, date.month() as f64)
    };

    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + date.day() as f64 + b
        - 1524.5
}

/// Julian Date of a UTC instant.
pub fn julian_date(instant: &DateTime<Utc>) -> f64 {
    let t = instant.time();
    let day_fraction = (t.hour() as f64 * 3600.0
        + t.minute() as f64 * 60.0
        + t.second() as f64
        + t.nanosecond() as f64 / 1e9)
        / 86_400.0;
    julian_day(instant.date_naive()) + day_fraction
}

/// Julian centuries since J2000.0.
pub fn julian_century(jd: f64) -> f64 {
    (jd - J2000) / 36525.0
}

fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569 - 0.00478 * (omega * DEG).sin()
}

fn obliquity_corrected(t: f64) -> f64 {
    let mean = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let omega = 125.04 - 1934.136 * t;
    mean + 0.00256 * (omega * DEG).cos()
}

/// Solar declination in degrees at Julian century `t`.
pub fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let lambda = sun_apparent_longitude(t) * DEG;
    (e.sin() * lambda.sin()).asin() / DEG
}

/// Equation of time in minutes at Julian century `t`.
pub fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let l0 = sun_mean_longitude(t) * DEG;
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t) * DEG;

    let y = (e / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq / DEG
}

/// Why the sun never reaches a given zenith angle on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarCondition {
    /// The sun stays above the horizon all day.
    PolarDay,
    /// The sun stays below the horizon all day.
    PolarNight,
}

impl std::fmt::Display for PolarCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolarCondition::PolarDay => write!(f, "polar day (sun never sets)"),
            PolarCondition::PolarNight => write!(f, "polar night (sun never rises)"),
        }
    }
}

/// Hour angle in degrees at which the sun's center sits at `zenith`.
///
/// Returns the polar condition instead when the sun never reaches that
/// zenith for the given latitude and declination.
pub fn hour_angle(lat: f64, declination: f64, zenith: f64) -> Result<f64, PolarCondition> {
    let lat_r = lat * DEG;
    let decl_r = declination * DEG;
    let cos_h = ((zenith * DEG).cos() - lat_r.sin() * decl_r.sin()) / (lat_r.cos() * decl_r.cos());

    if !cos_h.is_finite() {
        // At the poles the sun's altitude equals ±declination all day.
        let altitude = lat.signum() * declination;
        return if altitude > 90.0 - zenith {
            Err(PolarCondition::PolarDay)
        } else {
            Err(PolarCondition::PolarNight)
        };
    }
    if cos_h > 1.0 {
        return Err(PolarCondition::PolarNight);
    }
    if cos_h < -1.0 {
        return Err(PolarCondition::PolarDay);
    }
    Ok(cos_h.acos() / DEG)
}

/// Compute the solar position for a UTC instant, latitude, and longitude.
pub fn solar_position(instant: &DateTime<Utc>, lat: f64, lon: f64) -> SolarPosition {
    let t = julian_century(julian_date(instant));

    let decl = solar_declination(t);
    let eqt = equation_of_time(t);

    let time = instant.time();
    let minutes = time.hour() as f64 * 60.0 + time.minute() as f64 + time.second() as f64 / 60.0;
    let hour_angle = (minutes + eqt + 4.0 * lon) / 4.0 - 180.0;

    let lat_r = lat * DEG;
    let decl_r = decl * DEG;
    let ha_r = hour_angle * DEG;

    let sin_alt = (lat_r.sin() * decl_r.sin() + lat_r.cos() * decl_r.cos() * ha_r.cos()).clamp(-1.0, 1.0);
    let alt_r = sin_alt.asin();

    let azimuth = if lat_r.cos().abs() > 1e-10 && alt_r.cos().abs() > 1e-10 {
        let cos_az = (decl_r.sin() - alt_r.sin() * lat_r.sin()) / (alt_r.cos() * lat_r.cos());
        let az = cos_az.clamp(-1.0, 1.0).acos() / DEG;
        if ha_r.sin() > 0.0 { 360.0 - az } else { az }
    } else if decl > 0.0 {
        180.0
    } else {
        0.0
    };

    SolarPosition {
        altitude: alt_r / DEG,
        azimuth: normalize_degrees(azimuth),
        declination: decl,
        equation_of_time: eqt,
    }
}
