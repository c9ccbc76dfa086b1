use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PostureState {
    Upright,
    Tilted,
    Slumped,
    Absent,
}

impl PostureState {
    pub fn label(&self) -> &'static str {
        match self {
            PostureState::Upright => "upright",
            PostureState::Tilted => "tilted",
            PostureState::Slumped => "slumped",
            PostureState::Absent => "absent",
        }
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, PostureState::Tilted | PostureState::Slumped)
    }
}

/// Seconds spent in each posture state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureDurations {
    pub upright: f64,
    pub tilted: f64,
    pub slumped: f64,
    pub absent: f64,
}

impl PostureDurations {
    pub fn credit(&mut self, state: PostureState, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        match state {
            PostureState::Upright => self.upright += secs,
            PostureState::Tilted => self.tilted += secs,
            PostureState::Slumped => self.slumped += secs,
            PostureState::Absent => self.absent += secs,
        }
    }

    pub fn total(&self) -> f64 {
        self.upright + self.tilted + self.slumped + self.absent
    }
}

/// A sustained-bad-posture warning, raised once per episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureAlert {
    pub trigger: PostureState,
    pub message: String,
}

impl PostureAlert {
    pub fn for_state(trigger: PostureState, after_secs: f64) -> Self {
        let message = match trigger {
            PostureState::Slumped => format!(
                "You have been slumped over for more than {after_secs:.0} seconds! Straighten your back!"
            ),
            _ => format!(
                "You have been leaning to one side for more than {after_secs:.0} seconds! Return to an upright posture!"
            ),
        };
        Self { trigger, message }
    }
}

/// What the UI shows after each frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureReport {
    pub state: Option<PostureState>,
    pub label: String,
    pub alert: Option<PostureAlert>,
    /// Set only on the frame that raised the alert.
    pub alert_raised: bool,
    pub durations: PostureDurations,
    pub bad_streak_secs: f64,
}
