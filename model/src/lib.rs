#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod enrich;
mod sampler;
mod smooth;

use anyhow::Result;
use geom::{GPSBounds, LonLat};
use serde::{Deserialize, Serialize};

pub use self::enrich::{EnrichConfig, EnrichedTrace};
pub use self::sampler::{SamplerConfig, OFF_SCENE};

/// (longitude, latitude, altitude in meters) -- the component order the
/// rendering layers consume.
pub type TrajPoint = [f64; 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightID(pub usize);

/// An immutable recorded track: positions and capture times, index-aligned.
#[derive(Clone, Serialize, Deserialize)]
pub struct MovementTrace {
    path: Vec<TrajPoint>,
    timestamps: Vec<i64>,
}

impl MovementTrace {
    pub fn new(path: Vec<TrajPoint>, timestamps: Vec<i64>) -> Result<Self> {
        if path.len() != timestamps.len() {
            bail!(
                "{} points, but {} timestamps",
                path.len(),
                timestamps.len()
            );
        }
        // The ingestion side is supposed to sort, but don't trust it
        if timestamps.windows(2).any(|pair| pair[0] > pair[1]) {
            let mut pairs: Vec<(i64, TrajPoint)> = timestamps.into_iter().zip(path).collect();
            pairs.sort_by_key(|(time, _)| *time);
            return Ok(Self {
                path: pairs.iter().map(|(_, pt)| *pt).collect(),
                timestamps: pairs.into_iter().map(|(time, _)| time).collect(),
            });
        }
        Ok(Self { path, timestamps })
    }

    /// Drops fixes flagged void and picks an altitude per fix: GPS altitude
    /// when it reads as something, else pressure altitude, else 0.
    pub fn from_igc(file: &igc::IgcFile) -> Self {
        let mut path = Vec::new();
        let mut timestamps = Vec::new();
        let mut dropped = 0;
        for fix in &file.fixes {
            if !fix.valid {
                dropped += 1;
                continue;
            }
            let alt = match fix.gps_altitude {
                Some(alt) if alt != 0.0 => alt,
                _ if fix.pressure_altitude != 0.0 => fix.pressure_altitude,
                _ => 0.0,
            };
            path.push([fix.longitude, fix.latitude, alt]);
            timestamps.push(fix.timestamp_ms);
        }
        if dropped > 0 {
            warn!("Dropped {} void fixes", dropped);
        }
        Self::new(path, timestamps).unwrap()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path(&self) -> &[TrajPoint] {
        &self.path
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn start_time(&self) -> Option<i64> {
        self.timestamps.first().copied()
    }

    pub fn end_time(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }
}

pub struct Flight {
    pub id: FlightID,
    pub header: igc::Header,
    pub trace: MovementTrace,
    pub enriched: EnrichedTrace,
}

pub struct Model {
    pub flights: Vec<Flight>,
    pub gps_bounds: GPSBounds,
}

impl Model {
    pub fn new(files: Vec<igc::IgcFile>, cfg: &EnrichConfig) -> Self {
        let mut flights = Vec::new();
        let mut gps_bounds = GPSBounds::new();
        for file in files {
            let trace = MovementTrace::from_igc(&file);
            for pt in trace.path() {
                gps_bounds.update(LonLat::new(pt[0], pt[1]));
            }
            flights.push(Flight {
                id: FlightID(flights.len()),
                header: file.header,
                enriched: trace.enrich(cfg),
                trace,
            });
        }
        Self { flights, gps_bounds }
    }

    /// The shared replay domain: earliest start to latest end across all
    /// flights. None if no flight has any usable fix.
    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        let start = self
            .flights
            .iter()
            .filter_map(|flight| flight.trace.start_time())
            .min()?;
        let end = self
            .flights
            .iter()
            .filter_map(|flight| flight.trace.end_time())
            .max()?;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(MovementTrace::new(vec![[0.0, 0.0, 0.0]], vec![0, 1000]).is_err());
    }

    #[test]
    fn sorts_out_of_order_input() {
        let trace = MovementTrace::new(
            vec![[2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![2000, 0, 1000],
        )
        .unwrap();
        assert_eq!(trace.timestamps(), &[0, 1000, 2000]);
        assert_eq!(trace.path()[0], [0.0, 0.0, 0.0]);
        assert_eq!(trace.path()[2], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn from_igc_filters_and_falls_back() {
        let file = igc::IgcFile {
            header: igc::Header::default(),
            fixes: vec![
                igc::Fix {
                    timestamp_ms: 0,
                    latitude: 46.0,
                    longitude: 7.0,
                    valid: true,
                    pressure_altitude: 500.0,
                    gps_altitude: Some(0.0),
                },
                igc::Fix {
                    timestamp_ms: 1000,
                    latitude: 46.0,
                    longitude: 7.0,
                    valid: false,
                    pressure_altitude: 510.0,
                    gps_altitude: None,
                },
                igc::Fix {
                    timestamp_ms: 2000,
                    latitude: 46.1,
                    longitude: 7.1,
                    valid: true,
                    pressure_altitude: 520.0,
                    gps_altitude: Some(1200.0),
                },
            ],
        };
        let trace = MovementTrace::from_igc(&file);
        assert_eq!(trace.len(), 2);
        // Zero GPS altitude falls back to the pressure altitude
        assert_eq!(trace.path()[0][2], 500.0);
        assert_eq!(trace.path()[1][2], 1200.0);
        assert_eq!(trace.timestamps(), &[0, 2000]);
    }

    #[test]
    fn time_bounds_span_all_flights() {
        let file = |offset: i64| igc::IgcFile {
            header: igc::Header::default(),
            fixes: (0..3)
                .map(|i| igc::Fix {
                    timestamp_ms: offset + i * 1000,
                    latitude: 46.0,
                    longitude: 7.0 + i as f64 * 0.001,
                    valid: true,
                    pressure_altitude: 500.0,
                    gps_altitude: Some(1000.0),
                })
                .collect(),
        };
        let model = Model::new(vec![file(0), file(5000)], &EnrichConfig::default());
        assert_eq!(model.time_bounds(), Some((0, 7000)));
    }

    #[test]
    fn empty_model_has_no_bounds() {
        let model = Model::new(Vec::new(), &EnrichConfig::default());
        assert_eq!(model.time_bounds(), None);
    }
}
