use geom::LonLat;
use serde::{Deserialize, Serialize};

use crate::smooth::trailing_average;
use crate::{MovementTrace, TrajPoint};

const FALLBACK_COLOR: [u8; 3] = [0, 0, 0];

/// Tuning for the one-time per-track enrichment pass.
#[derive(Clone, Copy)]
pub struct EnrichConfig {
    /// Trailing window (in samples) for smoothing raw positions before any
    /// distance or speed is derived. Heavy by default, to keep GPS jitter
    /// out of the cumulative distance.
    pub path_window: usize,
    /// Trailing window (in samples) for smoothing instantaneous speed.
    pub speed_window: usize,
    /// Speed-to-color gradient. The domain is [max, min]: the fastest
    /// samples take the red end, the slowest the blue end.
    pub gradient: colorous::Gradient,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            path_window: 100,
            speed_window: 50,
            gradient: colorous::RED_YELLOW_BLUE,
        }
    }
}

/// Per-sample series derived once from a trace, parallel to its
/// path/timestamps indexing. Index 0 of every rate/distance series is 0.
#[derive(Clone, Serialize, Deserialize)]
pub struct EnrichedTrace {
    pub smoothed_path: Vec<TrajPoint>,
    /// Great-circle km between consecutive smoothed samples.
    pub segment_distances: Vec<f64>,
    /// Cumulative km.
    pub distance_from_start: Vec<f64>,
    /// Km/h between consecutive samples; 0 across repeated timestamps.
    pub speeds: Vec<f64>,
    pub smoothed_speeds: Vec<f64>,
    /// RGB per sample, from `smoothed_speeds` through the gradient.
    pub speed_colors: Vec<[u8; 3]>,
}

impl MovementTrace {
    pub fn enrich(&self, cfg: &EnrichConfig) -> EnrichedTrace {
        let n = self.len();
        let path = self.path();
        let timestamps = self.timestamps();

        let component = |c: usize| path.iter().map(|pt| pt[c]).collect::<Vec<_>>();
        let lon = trailing_average(&component(0), cfg.path_window);
        let lat = trailing_average(&component(1), cfg.path_window);
        let alt = trailing_average(&component(2), cfg.path_window);
        let smoothed_path: Vec<TrajPoint> =
            (0..n).map(|i| [lon[i], lat[i], alt[i]]).collect();

        let mut segment_distances = Vec::with_capacity(n);
        let mut distance_from_start = Vec::with_capacity(n);
        let mut speeds = Vec::with_capacity(n);
        let mut total = 0.0;
        for i in 0..n {
            let dist = if i == 0 {
                0.0
            } else {
                let prev = LonLat::new(smoothed_path[i - 1][0], smoothed_path[i - 1][1]);
                let here = LonLat::new(smoothed_path[i][0], smoothed_path[i][1]);
                prev.gps_dist(here).inner_meters() / 1000.0
            };
            total += dist;
            segment_distances.push(dist);
            distance_from_start.push(total);

            let dt_ms = if i == 0 {
                0
            } else {
                timestamps[i] - timestamps[i - 1]
            };
            // Repeated timestamps would divide to infinity; read them as not
            // moving instead
            speeds.push(if dt_ms <= 0 {
                0.0
            } else {
                dist / dt_ms as f64 * 3_600_000.0
            });
        }

        let smoothed_speeds = trailing_average(&speeds, cfg.speed_window);

        let slowest = smoothed_speeds.iter().copied().fold(f64::INFINITY, f64::min);
        let fastest = smoothed_speeds
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let speed_colors = smoothed_speeds
            .iter()
            .map(|speed| {
                let t = (fastest - speed) / (fastest - slowest);
                if t.is_finite() {
                    let color = cfg.gradient.eval_continuous(t.clamp(0.0, 1.0));
                    [color.r, color.g, color.b]
                } else {
                    FALLBACK_COLOR
                }
            })
            .collect();

        EnrichedTrace {
            smoothed_path,
            segment_distances,
            distance_from_start,
            speeds,
            smoothed_speeds,
            speed_colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_cfg() -> EnrichConfig {
        EnrichConfig {
            path_window: 1,
            speed_window: 1,
            ..Default::default()
        }
    }

    fn equator_trace() -> MovementTrace {
        MovementTrace::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![0, 1000, 2000],
        )
        .unwrap()
    }

    #[test]
    fn one_degree_of_equator_is_a_known_distance() {
        let enriched = equator_trace().enrich(&raw_cfg());
        assert_eq!(enriched.segment_distances[0], 0.0);
        assert!((enriched.segment_distances[1] - 111.19).abs() < 0.01);
        assert!((enriched.distance_from_start[2] - 2.0 * 111.19).abs() < 0.02);
    }

    #[test]
    fn cumulative_distance_never_decreases() {
        // A jittery track that doubles back on itself
        let path: Vec<TrajPoint> = (0..200)
            .map(|i| {
                let wobble = ((i * 7) % 13) as f64 * 1e-4;
                [7.0 + i as f64 * 1e-3 - wobble, 46.0 + wobble, 1000.0 + i as f64]
            })
            .collect();
        let timestamps: Vec<i64> = (0..200).map(|i| i * 1000).collect();
        let trace = MovementTrace::new(path, timestamps).unwrap();

        let enriched = trace.enrich(&EnrichConfig::default());
        assert_eq!(enriched.distance_from_start[0], 0.0);
        for pair in enriched.distance_from_start.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn speeds_stay_finite_across_repeated_timestamps() {
        let trace = MovementTrace::new(
            vec![
                [7.0, 46.0, 1000.0],
                [7.001, 46.001, 1010.0],
                [7.002, 46.002, 1020.0],
                [7.003, 46.003, 1030.0],
            ],
            vec![0, 1000, 1000, 2000],
        )
        .unwrap();
        let enriched = trace.enrich(&EnrichConfig::default());
        assert_eq!(enriched.speeds[0], 0.0);
        assert_eq!(enriched.speeds[2], 0.0);
        for series in [&enriched.speeds, &enriched.smoothed_speeds] {
            for speed in series.iter() {
                assert!(speed.is_finite());
                assert!(*speed >= 0.0);
            }
        }
    }

    #[test]
    fn enrichment_is_deterministic() {
        let trace = equator_trace();
        let cfg = EnrichConfig::default();
        let a = trace.enrich(&cfg);
        let b = trace.enrich(&cfg);
        assert_eq!(a.smoothed_path, b.smoothed_path);
        assert_eq!(a.segment_distances, b.segment_distances);
        assert_eq!(a.distance_from_start, b.distance_from_start);
        assert_eq!(a.speeds, b.speeds);
        assert_eq!(a.smoothed_speeds, b.smoothed_speeds);
        assert_eq!(a.speed_colors, b.speed_colors);
    }

    #[test]
    fn empty_trace_enriches_to_empty_series() {
        let trace = MovementTrace::new(Vec::new(), Vec::new()).unwrap();
        let enriched = trace.enrich(&EnrichConfig::default());
        assert!(enriched.smoothed_path.is_empty());
        assert!(enriched.segment_distances.is_empty());
        assert!(enriched.distance_from_start.is_empty());
        assert!(enriched.speeds.is_empty());
        assert!(enriched.smoothed_speeds.is_empty());
        assert!(enriched.speed_colors.is_empty());
    }

    #[test]
    fn fastest_sample_takes_the_red_end() {
        // Spacing grows, so speed grows monotonically after index 0
        let trace = MovementTrace::new(
            vec![
                [0.0, 0.0, 1000.0],
                [0.001, 0.0, 1000.0],
                [0.003, 0.0, 1000.0],
                [0.01, 0.0, 1000.0],
            ],
            vec![0, 1000, 2000, 3000],
        )
        .unwrap();
        let enriched = trace.enrich(&raw_cfg());

        // The domain is [max, min], so the fastest sample sits at the red
        // end of red-yellow-blue and the slowest (the 0 km/h start) at the
        // blue end
        let fastest = enriched.speed_colors[3];
        let slowest = enriched.speed_colors[0];
        assert!(fastest[0] > fastest[2]);
        assert!(slowest[2] > slowest[0]);
    }

    #[test]
    fn degenerate_speed_domain_falls_back_to_black() {
        // A single sample has one speed of 0, so the scale domain collapses
        let single = MovementTrace::new(vec![[0.0, 0.0, 0.0]], vec![0]).unwrap();
        let enriched = single.enrich(&raw_cfg());
        assert_eq!(enriched.speed_colors, vec![[0, 0, 0]]);
    }

    #[test]
    fn heavy_path_window_drags_the_smoothed_path_behind() {
        let trace = equator_trace();
        let enriched = trace.enrich(&EnrichConfig::default());
        assert_eq!(enriched.smoothed_path[0], [0.0, 0.0, 0.0]);
        assert!((enriched.smoothed_path[1][0] - 0.5).abs() < 1e-12);
        assert!((enriched.smoothed_path[2][0] - 1.0).abs() < 1e-12);
    }
}
