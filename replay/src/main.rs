#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;
use chrono::{DateTime, Utc};
use geom::{Duration, Speed, UnitFmt};
use structopt::StructOpt;

use model::{EnrichConfig, Flight, Model, SamplerConfig, OFF_SCENE};

#[derive(StructOpt)]
struct Args {
    /// Paths to IGC track files to replay together
    #[structopt(required = true)]
    tracks: Vec<String>,
    /// Milliseconds of recorded time between readouts
    #[structopt(long, default_value = "60000")]
    interval: i64,
    /// Write the loaded tracks to this path as GeoJSON instead of replaying
    #[structopt(long)]
    geojson: Option<String>,
}

fn main() -> Result<()> {
    abstutil::logger::setup();
    let args = Args::from_iter(abstutil::cli_args());
    if args.interval <= 0 {
        bail!("--interval must be positive");
    }

    let model = {
        let mut timer = Timer::new("load IGC tracks");
        let mut files = Vec::new();
        timer.start_iter("parse tracks", args.tracks.len());
        for path in &args.tracks {
            timer.next();
            let raw = fs_err::read_to_string(path)?;
            files.push(igc::parse(&raw).map_err(|err| anyhow!("{path}: {err}"))?);
        }
        Model::new(files, &EnrichConfig::default())
    };

    for flight in &model.flights {
        print_summary(flight);
    }

    if let Some(path) = args.geojson {
        return write_geojson(&path, &model);
    }
    replay(&model, args.interval)
}

fn print_summary(flight: &Flight) {
    let header = &flight.header;
    println!(
        "Flight {}: {}, {}, {}",
        flight.id.0,
        header.pilot.as_deref().unwrap_or("unknown pilot"),
        header
            .date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "unknown date".to_string()),
        header.site.as_deref().unwrap_or("unknown site"),
    );
    println!("  {} fixes", prettyprint_usize(flight.trace.len()));
    if let (Some(start), Some(end)) = (flight.trace.start_time(), flight.trace.end_time()) {
        println!(
            "  duration {}",
            Duration::seconds((end - start) as f64 / 1000.0)
        );
    }
    if let Some(total) = flight.enriched.distance_from_start.last() {
        println!("  total distance {:.1} km", total);
    }
    let max_speed = flight
        .enriched
        .smoothed_speeds
        .iter()
        .copied()
        .fold(0.0, f64::max);
    if max_speed > 0.0 {
        let metric = UnitFmt {
            round_durations: false,
            metric: true,
        };
        println!(
            "  max speed {}",
            Speed::meters_per_second(max_speed / 3.6).to_string(&metric)
        );
    }
    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    for pt in flight.trace.path() {
        lowest = lowest.min(pt[2]);
        highest = highest.max(pt[2]);
    }
    if lowest.is_finite() {
        println!("  altitude {:.0}m to {:.0}m", lowest, highest);
    }
}

fn replay(model: &Model, interval: i64) -> Result<()> {
    let (start, end) = match model.time_bounds() {
        Some(pair) => pair,
        None => bail!("No flights with usable fixes"),
    };
    let cfg = SamplerConfig::default();
    let metric = UnitFmt {
        round_durations: false,
        metric: true,
    };

    let mut time = start;
    while time < end {
        println!("{}", clock(time));
        for flight in &model.flights {
            let pos = flight.trace.position_at(time, &cfg);
            if pos == OFF_SCENE {
                println!("  flight {}: away", flight.id.0);
                continue;
            }
            let orientation = flight.trace.orientation_at(time, &cfg);
            let (speed, dist) = match flight.trace.index_at(time) {
                Some(idx) => (
                    flight.enriched.smoothed_speeds[idx],
                    flight.enriched.distance_from_start[idx],
                ),
                None => (0.0, 0.0),
            };
            println!(
                "  flight {}: alt {:.0}m, speed {}, {:.1} km from launch, heading {:.0}°",
                flight.id.0,
                pos[2],
                Speed::meters_per_second(speed / 3.6).to_string(&metric),
                dist,
                orientation[1],
            );
        }
        time += interval;
    }
    Ok(())
}

fn clock(time_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(time_ms) {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => time_ms.to_string(),
    }
}

fn write_geojson(path: &str, model: &Model) -> Result<()> {
    use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

    let mut features = Vec::new();
    for flight in &model.flights {
        let coords: Vec<Vec<f64>> = flight.trace.path().iter().map(|pt| pt.to_vec()).collect();

        let mut properties = serde_json::Map::new();
        if let serde_json::Value::Object(header) = serde_json::to_value(&flight.header)? {
            properties.extend(header);
        }
        if let Some(total) = flight.enriched.distance_from_start.last() {
            properties.insert("distance_km".to_string(), (*total).into());
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coords))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let bbox = if model.flights.iter().any(|flight| !flight.trace.is_empty()) {
        let bounds = &model.gps_bounds;
        Some(vec![
            bounds.min_lon,
            bounds.min_lat,
            bounds.max_lon,
            bounds.max_lat,
        ])
    } else {
        None
    };
    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox,
        foreign_members: None,
    });
    fs_err::write(path, serde_json::to_string(&gj)?)?;
    info!("Wrote {}", path);
    Ok(())
}
