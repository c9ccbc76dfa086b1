use serde::{Deserialize, Serialize};

/// How a user limb is compared against the reference limb.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SimilarityStrategy {
    /// Direction of a two-joint segment, compared by cosine similarity.
    #[default]
    Cosine,
    /// Interior angle at the middle of three joints.
    Angle,
}

/// Anti-gaming check: how much the user has to move for the score to count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum MotionGuard {
    /// Summed frame-to-frame travel of the hip midpoint, in normalized units.
    HipDisplacement { min_total: f64 },
    /// Orientation range in degrees that at least one tracked limb must sweep.
    RangeOfMotion { min_degrees: f64 },
}

impl Default for MotionGuard {
    fn default() -> Self {
        MotionGuard::HipDisplacement { min_total: 0.1 }
    }
}

/// Tunable thresholds for session scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub strategy: SimilarityStrategy,

    /// A reference frame matches only if strictly closer than this, in seconds.
    pub match_tolerance_secs: f64,

    /// Denominator of the response curve `100 * exp(-d^2 / sensitivity)`.
    pub sensitivity: f64,

    /// Raw limb scores below this are zeroed.
    pub score_floor: f64,

    /// Joints below this visibility zero out the limb.
    pub visibility_threshold: f64,

    pub motion_guard: MotionGuard,

    /// Ceiling applied when the motion guard trips.
    pub motion_cap: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: SimilarityStrategy::Cosine,
            match_tolerance_secs: 0.1,
            sensitivity: 200.0,
            score_floor: 10.0,
            visibility_threshold: 0.5,
            motion_guard: MotionGuard::default(),
            motion_cap: 20,
        }
    }
}
