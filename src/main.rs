use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use geoframe::address::{builtin_policies, AddressNormalizer, BuiltinCountries, RawAddress};
use geoframe::daylight::{SolarCalculator, SolarEvent, SolarEventKind};
use geoframe::geo::{distance, format_coords, Coordinate};
use geoframe::timezone::{TimezoneResolver, TimezoneTable};
use geoframe::{Config, Error, Result};
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// geoframe — timezone, daylight and address data for a coordinate.
///
/// Results are printed as JSON on stdout; logs go to stderr.
///
/// Examples:
///   geoframe timezone --lat 40.7128 --lon -74.0060 --date 2024-07-01
///   geoframe sun --lat 27.9881 --lon 86.9250 --elevation 8848
///   geoframe distance --from 59.3293,18.0686 --to 60.1699,24.9384
///   geoframe address response.json --provider nominatim
#[derive(Parser)]
#[command(name = "geoframe", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr; repeat for trace output.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Great-circle distance between two points.
    Distance {
        /// First point as LAT,LON.
        #[arg(long, allow_hyphen_values = true, value_parser = parse_point)]
        from: (f64, f64),
        /// Second point as LAT,LON.
        #[arg(long, allow_hyphen_values = true, value_parser = parse_point)]
        to: (f64, f64),
    },

    /// IANA zone and UTC offset at a point.
    Timezone {
        #[command(flatten)]
        point: PointArgs,
        /// Evaluate the offset at local noon of this date (YYYY-MM-DD).
        #[arg(long, short = 'd', conflicts_with = "at")]
        date: Option<NaiveDate>,
        /// Evaluate the offset at this instant (RFC 3339).
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Sunrise and sunset at a point.
    Sun {
        #[command(flatten)]
        point: PointArgs,
        /// Observer height above the surrounding terrain, meters.
        #[arg(long, short = 'e', allow_hyphen_values = true)]
        elevation: Option<f64>,
        /// Date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long, short = 'd')]
        date: Option<NaiveDate>,
        /// IANA timezone override (e.g. Europe/Oslo).
        #[arg(long)]
        tz: Option<String>,
        /// Instant for the day/night check (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Normalize a reverse-geocoding JSON response.
    Address {
        /// JSON file; reads stdin when omitted or `-`.
        input: Option<PathBuf>,
        /// Provider policy id. Defaults to the configured provider.
        #[arg(long, short = 'p')]
        provider: Option<String>,
        /// Queried latitude, used when the response has none.
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,
        /// Queried longitude, used when the response has none.
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
    },

    /// List available provider policies.
    Providers,
}

#[derive(Args)]
struct PointArgs {
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

impl PointArgs {
    fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.lat, self.lon)
    }
}

fn parse_point(s: &str) -> std::result::Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected LAT,LON but got '{}'", s))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v.trim(), e));
    Ok((parse(lat)?, parse(lon)?))
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoframe=warn")),
        1 => EnvFilter::new("geoframe=debug"),
        _ => EnvFilter::new("geoframe=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = load_config(cli.config.as_deref()).and_then(|config| run(cli.command, &config));
    match output {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn run(command: Command, config: &Config) -> Result<Value> {
    match command {
        Command::Distance { from, to } => {
            let a = Coordinate::new(from.0, from.1)?;
            let b = Coordinate::new(to.0, to.1)?;
            let meters = distance(&a, &b);
            Ok(json!({
                "from": format_coords(a.latitude(), a.longitude()),
                "to": format_coords(b.latitude(), b.longitude()),
                "meters": meters,
                "kilometers": meters / 1000.0,
            }))
        }
        Command::Timezone { point, date, at } => timezone(config, &point, date, at),
        Command::Sun { point, elevation, date, tz, at } => sun(config, &point, elevation, date, tz.as_deref(), at),
        Command::Address { input, provider, lat, lon } => {
            address(config, input.as_deref(), provider.as_deref(), lat.zip(lon))
        }
        Command::Providers => Ok(providers(config)),
    }
}

// ─── Timezone & Daylight ────────────────────────────────────────────────────

/// The configured dataset when there is one, else the embedded table.
fn reference_resolver<'a>(config: &Config, custom: Option<&'a TimezoneTable>) -> TimezoneResolver<'a> {
    let table = custom.unwrap_or_else(|| TimezoneTable::builtin());
    debug!(references = table.len(), "timezone table ready");
    TimezoneResolver::new(table, config.resolver)
}

fn timezone(config: &Config, point: &PointArgs, date: Option<NaiveDate>, at: Option<DateTime<Utc>>) -> Result<Value> {
    let coord = point.coordinate()?;
    let custom = config.dataset()?;
    let resolver = reference_resolver(config, custom.as_ref());

    let tz = match at {
        Some(instant) => resolver.resolve_at(&coord, instant)?,
        None => resolver.resolve(&coord, date)?,
    };
    let mut value = serde_json::to_value(&tz)?;
    value["location"] = json!(format_coords(coord.latitude(), coord.longitude()));
    Ok(value)
}

fn sun(
    config: &Config,
    point: &PointArgs,
    elevation: Option<f64>,
    date: Option<NaiveDate>,
    tz: Option<&str>,
    at: Option<DateTime<Utc>>,
) -> Result<Value> {
    let mut coord = point.coordinate()?;
    if let Some(h) = elevation {
        coord = coord.with_elevation(h)?;
    }
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let custom = config.dataset()?;
    let resolver = reference_resolver(config, custom.as_ref());

    let zone = match tz {
        Some(name) => Some(name.parse::<Tz>().map_err(|_| Error::UnknownZone(name.to_string()))?),
        None => match resolver.zone_for(&coord) {
            Ok(_) => None,
            Err(Error::TimezoneNotFound { .. }) => {
                warn!("no timezone reference near the point; reporting times in UTC");
                Some(Tz::UTC)
            }
            Err(e) => return Err(e),
        },
    };

    let calc = SolarCalculator::new(resolver);
    let day = calc.day(&coord, date);
    let sunrise = sun_event(&calc, &coord, date, SolarEventKind::Sunrise, zone)?;
    let sunset = sun_event(&calc, &coord, date, SolarEventKind::Sunset, zone)?;
    let instant = at.unwrap_or_else(Utc::now);

    Ok(json!({
        "location": format_coords(coord.latitude(), coord.longitude()),
        "elevation_m": coord.elevation(),
        "date": date,
        "day": day,
        "sunrise": sunrise,
        "sunset": sunset,
        "at": instant,
        "is_daytime": calc.is_daytime(&coord, instant),
    }))
}

/// One event, or `None` when the sun does not cross the horizon.
fn sun_event(
    calc: &SolarCalculator<'_>,
    coord: &Coordinate,
    date: NaiveDate,
    kind: SolarEventKind,
    zone: Option<Tz>,
) -> Result<Option<SolarEvent>> {
    let result = match zone {
        Some(zone) => calc.event_in_zone(coord, date, kind, zone),
        None => calc.event(coord, date, kind),
    };
    match result {
        Ok(event) => Ok(Some(event)),
        Err(Error::NoSolarEvent { condition, .. }) => {
            debug!(%kind, %condition, "no solar event");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// ─── Address ────────────────────────────────────────────────────────────────

fn address(config: &Config, input: Option<&Path>, provider: Option<&str>, query: Option<(f64, f64)>) -> Result<Value> {
    let id = provider.unwrap_or(&config.address.default_provider);
    let policy = config
        .policy(id)
        .ok_or_else(|| Error::Config(format!("Unknown provider policy '{}'. Run `geoframe providers`.", id)))?;

    let text = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let document: Value = serde_json::from_str(&text)?;

    let lookup = BuiltinCountries;
    let mut normalizer = AddressNormalizer::new();
    if config.address.country_lookup {
        normalizer = normalizer.with_country_lookup(&lookup);
    }
    let query = query.map(|(lat, lon)| Coordinate::new(lat, lon)).transpose()?;

    let normalize_one = |doc: Value| {
        let raw = RawAddress::from_json(doc);
        match &query {
            Some(q) => normalizer.normalize_at(&raw, &policy, q),
            None => normalizer.normalize(&raw, &policy),
        }
    };

    // Search endpoints return a list of places; reverse endpoints one object.
    let value = match document {
        Value::Array(items) => {
            let addresses = items.into_iter().map(normalize_one).collect::<Result<Vec<_>>>()?;
            serde_json::to_value(addresses)
        }
        other => serde_json::to_value(normalize_one(other)?),
    };
    Ok(value?)
}

fn providers(config: &Config) -> Value {
    let mut list: Vec<Value> = builtin_policies()
        .into_iter()
        .filter(|p| !config.policies.contains_key(&p.id))
        .map(|p| json!({ "id": p.id, "label": p.label, "source": "builtin" }))
        .collect();
    list.extend(
        config
            .policies
            .keys()
            .map(|id| json!({ "id": id, "label": id, "source": "config" })),
    );
    list.push(json!({ "id": "canonical", "label": "Canonical field names", "source": "builtin" }));
    json!({ "default": config.address.default_provider, "providers": list })
}
