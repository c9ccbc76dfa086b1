use serde::Serialize;

use crate::models::Frame;

use super::config::MotionGuard;
use super::limbs::LimbSpec;
use super::similarity::{limb_measure, limb_visible};

/// How much the user moved over the whole recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSummary {
    /// Summed frame-to-frame travel of the hip midpoint.
    pub hip_travel: f64,
    /// Orientation range swept by each limb, in degrees, same order as the limb set.
    pub limb_ranges: Vec<f64>,
}

impl MotionSummary {
    pub fn satisfies(&self, guard: &MotionGuard) -> bool {
        match *guard {
            MotionGuard::HipDisplacement { min_total } => self.hip_travel >= min_total,
            MotionGuard::RangeOfMotion { min_degrees } => {
                self.limb_ranges.iter().any(|range| *range >= min_degrees)
            }
        }
    }
}

/// Running min/max of a limb measure, unwrapped so a segment pointing across
/// the ±180° seam doesn't register as a full sweep.
#[derive(Debug, Clone, Copy, Default)]
struct RangeTracker {
    last_raw: Option<f64>,
    unwrapped: f64,
    min: f64,
    max: f64,
}

impl RangeTracker {
    fn observe(&mut self, raw: f64) {
        match self.last_raw {
            None => {
                self.unwrapped = raw;
                self.min = raw;
                self.max = raw;
            }
            Some(last) => {
                let mut delta = raw - last;
                if delta > 180.0 {
                    delta -= 360.0;
                } else if delta < -180.0 {
                    delta += 360.0;
                }
                self.unwrapped += delta;
                self.min = self.min.min(self.unwrapped);
                self.max = self.max.max(self.unwrapped);
            }
        }
        self.last_raw = Some(raw);
    }

    fn range(&self) -> f64 {
        if self.last_raw.is_some() {
            self.max - self.min
        } else {
            0.0
        }
    }
}

/// Measures hip travel and per-limb range over every complete frame of the recording.
/// Limb ranges only count frames where the limb is visible.
pub fn measure_motion(
    recording: &[Frame],
    limbs: &[LimbSpec],
    visibility_threshold: f64,
) -> MotionSummary {
    let mut hip_travel = 0.0;
    let mut last_center: Option<(f64, f64)> = None;
    let mut trackers = vec![RangeTracker::default(); limbs.len()];

    for frame in recording.iter().filter(|f| f.is_complete()) {
        if let Some(center) = frame.hip_center() {
            if let Some(last) = last_center {
                hip_travel += ((center.0 - last.0).powi(2) + (center.1 - last.1).powi(2)).sqrt();
            }
            last_center = Some(center);
        }

        for (tracker, limb) in trackers.iter_mut().zip(limbs) {
            if limb_visible(frame, limb.joints, visibility_threshold) != Some(true) {
                continue;
            }
            if let Some(measure) = limb_measure(frame, limb.joints) {
                tracker.observe(measure);
            }
        }
    }

    MotionSummary {
        hip_travel,
        limb_ranges: trackers.iter().map(RangeTracker::range).collect(),
    }
}
