//! Static timezone reference table.
//!
//! Rows are `(place, latitude, longitude, zone)`. The built-in table is
//! embedded at compile time and parsed once on first use; after that it is
//! read-only for the life of the process.

use crate::error::{Error, Result};
use crate::geo::{self, Coordinate};
use chrono_tz::Tz;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static BUILTIN_CSV: &str = include_str!("../../data/timezones.csv");

static BUILTIN: LazyLock<TimezoneTable> = LazyLock::new(|| {
    TimezoneTable::from_reader(BUILTIN_CSV.as_bytes()).expect("embedded timezone table is valid")
});

/// One reference point: a place whose IANA zone is known.
#[derive(Debug, Clone, PartialEq)]
pub struct TimezoneReference {
    pub place: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub zone: Tz,
}

impl TimezoneReference {
    pub fn new(latitude: f64, longitude: f64, zone: Tz) -> Result<Self> {
        Coordinate::new(latitude, longitude)?;
        Ok(Self { place: None, latitude, longitude, zone })
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn zone_name(&self) -> &'static str {
        self.zone.name()
    }

    /// Distance in meters from this reference to `point`.
    pub fn distance_to(&self, point: &Coordinate) -> f64 {
        geo::haversine_m(self.latitude, self.longitude, point.latitude(), point.longitude())
    }
}

/// A reference match together with its distance from the query point.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub reference: &'a TimezoneReference,
    pub distance_m: f64,
}

/// Nearest-reference lookup.
///
/// The resolver only talks to this trait, so a k-d tree or grid index can
/// stand in for the linear table without touching the resolver.
pub trait ReferenceIndex: Send + Sync {
    /// The closest reference strictly within `radius_m` of `point`.
    ///
    /// When two references are equally close, the one listed first wins.
    fn nearest_within(&self, point: &Coordinate, radius_m: f64) -> Option<Candidate<'_>>;
}

/// Flat, ordered list of references scanned linearly.
#[derive(Debug, Clone, Default)]
pub struct TimezoneTable {
    references: Vec<TimezoneReference>,
}

#[derive(Deserialize)]
struct Row {
    #[serde(default)]
    place: Option<String>,
    latitude: f64,
    longitude: f64,
    zone: String,
}

impl TimezoneTable {
    /// The embedded city table.
    pub fn builtin() -> &'static TimezoneTable {
        &BUILTIN
    }

    pub fn from_references(references: Vec<TimezoneReference>) -> Self {
        Self { references }
    }

    /// Parse a CSV table with a `place,latitude,longitude,zone` header.
    ///
    /// `place` may be omitted or empty. Every row is validated; the first
    /// bad row aborts the load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut references = Vec::new();

        for (idx, row) in csv.deserialize::<Row>().enumerate() {
            // header is line 1
            let line = idx as u64 + 2;
            let row = row.map_err(|e| Error::Dataset { line, message: e.to_string() })?;

            let zone: Tz = row.zone.parse().map_err(|_| Error::Dataset {
                line,
                message: format!("unknown zone '{}'", row.zone),
            })?;
            let reference = TimezoneReference::new(row.latitude, row.longitude, zone)
                .map_err(|e| Error::Dataset { line, message: e.to_string() })?;
            references.push(match row.place.filter(|p| !p.is_empty()) {
                Some(place) => reference.with_place(place),
                None => reference,
            });
        }

        debug!(count = references.len(), "loaded timezone reference table");
        Ok(Self { references })
    }

    /// Load a CSV table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimezoneReference> {
        self.references.iter()
    }
}

impl ReferenceIndex for TimezoneTable {
    fn nearest_within(&self, point: &Coordinate, radius_m: f64) -> Option<Candidate<'_>> {
        let mut best: Option<Candidate<'_>> = None;
        for reference in &self.references {
            let distance_m = reference.distance_to(point);
            if distance_m >= radius_m {
                continue;
            }
            // strict `<` keeps the earliest row on ties
            if best.map_or(true, |b| distance_m < b.distance_m) {
                best = Some(Candidate { reference, distance_m });
            }
        }
        best
    }
}
