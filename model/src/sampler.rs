use serde::{Deserialize, Serialize};

use crate::smooth::window_start;
use crate::{MovementTrace, TrajPoint};

/// Returned instead of an extrapolated position when the query time falls
/// outside the recorded range; far enough below the map to be off-scene.
pub const OFF_SCENE: TrajPoint = [0.0, 0.0, -10_000.0];

/// Tuning for per-query sampling. Every query is a pure function of
/// (trace, time, config); there is no state between calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Trailing window (in samples) averaged into each bracketing endpoint
    /// before positions are interpolated. 0 interpolates the raw fixes.
    pub position_window: usize,
    /// Trailing window (in samples) of per-segment yaw/pitch averaged into
    /// each bracketing attitude.
    pub orientation_window: usize,
    /// Degrees added after interpolation to match the rendered asset's
    /// native orientation: [pitch, yaw, roll].
    pub mount: [f64; 3],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            position_window: 0,
            orientation_window: 10,
            mount: [90.0, 0.0, 90.0],
        }
    }
}

impl SamplerConfig {
    /// The attitude reported when the query time is outside the recorded
    /// range.
    pub fn neutral_attitude(&self) -> [f64; 3] {
        [self.mount[0] - 90.0, self.mount[1], self.mount[2]]
    }
}

impl MovementTrace {
    /// The index of the first sample strictly after `time_ms`, plus the
    /// fractional offset between the bracketing samples. None outside the
    /// recorded range.
    fn bracket(&self, time_ms: i64) -> Option<(usize, f64)> {
        let timestamps = self.timestamps();
        let idx = timestamps.partition_point(|&t| t <= time_ms);
        if idx < 1 || idx >= timestamps.len() {
            return None;
        }
        let span = timestamps[idx] - timestamps[idx - 1];
        // A zero span can't divide; snap to the earlier sample
        let t = if span == 0 {
            0.0
        } else {
            (time_ms - timestamps[idx - 1]) as f64 / span as f64
        };
        Some((idx, t))
    }

    /// Where the object is at `time_ms`, or `OFF_SCENE` outside the
    /// recorded range.
    pub fn position_at(&self, time_ms: i64, cfg: &SamplerConfig) -> TrajPoint {
        match self.bracket(time_ms) {
            Some((idx, t)) => {
                let a = self.window_point(idx - 1, cfg.position_window);
                let b = self.window_point(idx, cfg.position_window);
                [
                    lerp(a[0], b[0], t),
                    lerp(a[1], b[1], t),
                    lerp(a[2], b[2], t),
                ]
            }
            None => OFF_SCENE,
        }
    }

    /// The attitude in degrees at `time_ms` -- [pitch, yaw, roll] with the
    /// mount offset applied -- or the neutral fallback outside the recorded
    /// range.
    pub fn orientation_at(&self, time_ms: i64, cfg: &SamplerConfig) -> [f64; 3] {
        match self.bracket(time_ms) {
            Some((idx, t)) => {
                let (pitch1, yaw1) = self.window_attitude(idx - 1, cfg.orientation_window);
                let (pitch2, yaw2) = self.window_attitude(idx, cfg.orientation_window);
                [
                    cfg.mount[0] + lerp(pitch1, pitch2, t),
                    cfg.mount[1] + lerp(yaw1, yaw2, t),
                    cfg.mount[2],
                ]
            }
            None => cfg.neutral_attitude(),
        }
    }

    /// The index into the per-sample enriched series to read out at
    /// `time_ms`.
    pub fn index_at(&self, time_ms: i64) -> Option<usize> {
        let timestamps = self.timestamps();
        let idx = timestamps.partition_point(|&t| t < time_ms);
        if idx < timestamps.len() {
            Some(idx)
        } else {
            None
        }
    }

    fn window_point(&self, end: usize, window: usize) -> TrajPoint {
        let path = self.path();
        if window <= 1 {
            return path[end];
        }
        let lo = window_start(end, window);
        let mut sum = [0.0; 3];
        for pt in &path[lo..=end] {
            sum[0] += pt[0];
            sum[1] += pt[1];
            sum[2] += pt[2];
        }
        let n = (end - lo + 1) as f64;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }

    /// Mean yaw/pitch of the segments in the trailing window ending at
    /// `end`. The first sample borrows the first segment, so every index
    /// has a defined attitude.
    fn window_attitude(&self, end: usize, window: usize) -> (f64, f64) {
        let path = self.path();
        let hi = end.max(1);
        let lo = window_start(hi, window).max(1);
        let mut pitch = 0.0;
        let mut yaw = 0.0;
        for k in lo..=hi {
            pitch += pitch_between(&path[k - 1], &path[k]);
            yaw += yaw_between(&path[k - 1], &path[k]);
        }
        let n = (hi - lo + 1) as f64;
        (pitch / n, yaw / n)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Horizontal bearing of the segment, in degrees.
fn yaw_between(a: &TrajPoint, b: &TrajPoint) -> f64 {
    (b[1] - a[1]).atan2(b[0] - a[0]).to_degrees()
}

/// Climb attitude of the segment, in degrees. A segment with no altitude on
/// either end reads as a fixed nose-down attitude instead of oscillating.
fn pitch_between(a: &TrajPoint, b: &TrajPoint) -> f64 {
    if a[2] == 0.0 && b[2] == 0.0 {
        return -90.0;
    }
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx.hypot(dz).atan2(dy) + std::f64::consts::PI).to_degrees()
}
