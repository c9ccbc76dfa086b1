use serde::{Deserialize, Serialize};

/// Thresholds for posture classification and alerting.
///
/// Coordinates are normalized image space, so `y` grows downward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostureConfig {
    /// Shoulder height difference at or above which the user counts as tilted.
    pub tilt_threshold: f64,

    /// Open interval of nose-below-shoulders offsets that reads as slumped.
    pub slump_head_offset_min: f64,
    pub slump_head_offset_max: f64,

    /// Continuous bad posture before an alert fires, in seconds.
    pub alert_after_secs: f64,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            tilt_threshold: 0.05,
            slump_head_offset_min: -0.05,
            slump_head_offset_max: 0.1,
            alert_after_secs: 20.0,
        }
    }
}
