use std::time::{Duration, Instant};

use crate::models::landmark::{LEFT_SHOULDER, NOSE, RIGHT_SHOULDER};
use crate::models::{Landmark, LANDMARK_COUNT};

use super::config::PostureConfig;
use super::state::{PostureAlert, PostureDurations, PostureReport, PostureState};

/// Instantaneous posture for one set of landmarks.
pub fn classify(landmarks: &[Landmark], config: &PostureConfig) -> PostureState {
    if landmarks.len() < LANDMARK_COUNT {
        return PostureState::Absent;
    }

    let left = &landmarks[LEFT_SHOULDER];
    let right = &landmarks[RIGHT_SHOULDER];
    let nose = &landmarks[NOSE];

    let shoulder_slope = (left.y - right.y).abs();
    let head_offset = nose.y - (left.y + right.y) / 2.0;

    if shoulder_slope >= config.tilt_threshold {
        PostureState::Tilted
    } else if head_offset > config.slump_head_offset_min
        && head_offset < config.slump_head_offset_max
    {
        PostureState::Slumped
    } else {
        PostureState::Upright
    }
}

/// Streaming posture state machine.
///
/// `checkpoint` marks when the current state was entered (or last credited);
/// time since then belongs to `state` and is credited on the next transition.
/// `last_frame_at` drives the bad-posture streak, which only grows across
/// consecutive bad frames.
#[derive(Debug, Clone)]
pub struct PostureMonitor {
    config: PostureConfig,
    state: Option<PostureState>,
    checkpoint: Option<Instant>,
    last_frame_at: Option<Instant>,
    durations: PostureDurations,
    bad_streak: Duration,
    alert: Option<PostureAlert>,
}

impl PostureMonitor {
    pub fn new(config: PostureConfig) -> Self {
        Self {
            config,
            state: None,
            checkpoint: None,
            last_frame_at: None,
            durations: PostureDurations::default(),
            bad_streak: Duration::ZERO,
            alert: None,
        }
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    pub fn state(&self) -> Option<PostureState> {
        self.state
    }

    pub fn durations(&self) -> PostureDurations {
        self.durations
    }

    pub fn alert(&self) -> Option<&PostureAlert> {
        self.alert.as_ref()
    }

    pub fn bad_streak(&self) -> Duration {
        self.bad_streak
    }

    /// Classifies the frame and advances timers to `now`.
    pub fn observe(&mut self, landmarks: &[Landmark], now: Instant) -> PostureReport {
        let next = classify(landmarks, &self.config);
        let previous = self.state;

        let since_last_frame = self
            .last_frame_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        self.last_frame_at = Some(now);

        if previous != Some(next) {
            self.credit_current(now);
            self.state = Some(next);
            self.checkpoint = Some(now);
        }

        match next {
            PostureState::Tilted | PostureState::Slumped => {
                if previous.is_some_and(|p| p.is_bad()) {
                    self.bad_streak += since_last_frame;
                }
            }
            PostureState::Upright => {
                self.bad_streak = Duration::ZERO;
                self.alert = None;
            }
            PostureState::Absent => {
                self.bad_streak = Duration::ZERO;
            }
        }

        let mut alert_raised = false;
        if next.is_bad()
            && self.alert.is_none()
            && self.bad_streak.as_secs_f64() >= self.config.alert_after_secs
        {
            self.alert = Some(PostureAlert::for_state(next, self.config.alert_after_secs));
            alert_raised = true;
        }

        let mut report = self.report();
        report.alert_raised = alert_raised;
        report
    }

    /// Credits the running state up to `now` and stops the clocks.
    pub fn pause(&mut self, now: Instant) {
        self.credit_current(now);
        self.checkpoint = None;
        self.last_frame_at = None;
    }

    /// Restarts the clocks without crediting the time spent paused.
    pub fn resume(&mut self, now: Instant) {
        if self.state.is_some() {
            self.checkpoint = Some(now);
        }
        self.last_frame_at = None;
    }

    /// Credits the running state up to `now` and returns the totals.
    pub fn finish(&mut self, now: Instant) -> PostureDurations {
        self.credit_current(now);
        if self.checkpoint.is_some() {
            self.checkpoint = Some(now);
        }
        self.durations
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn report(&self) -> PostureReport {
        PostureReport {
            state: self.state,
            label: self.state.map(|s| s.label()).unwrap_or("unknown").to_string(),
            alert: self.alert.clone(),
            alert_raised: false,
            durations: self.durations,
            bad_streak_secs: self.bad_streak.as_secs_f64(),
        }
    }

    fn credit_current(&mut self, now: Instant) {
        if let (Some(state), Some(checkpoint)) = (self.state, self.checkpoint) {
            self.durations
                .credit(state, now.saturating_duration_since(checkpoint));
        }
    }
}

impl Default for PostureMonitor {
    fn default() -> Self {
        Self::new(PostureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Skeleton with the given shoulder heights and nose height.
    fn body(left_y: f64, right_y: f64, nose_y: f64) -> Vec<Landmark> {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 1.0); LANDMARK_COUNT];
        landmarks[LEFT_SHOULDER] = Landmark::new(0.6, left_y, 1.0);
        landmarks[RIGHT_SHOULDER] = Landmark::new(0.4, right_y, 1.0);
        landmarks[NOSE] = Landmark::new(0.5, nose_y, 1.0);
        landmarks
    }

    fn upright() -> Vec<Landmark> {
        body(0.5, 0.5, 0.3)
    }

    fn tilted() -> Vec<Landmark> {
        body(0.5, 0.58, 0.3)
    }

    fn slumped() -> Vec<Landmark> {
        body(0.5, 0.52, 0.51)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn classifies_by_slope_and_head_offset() {
        let config = PostureConfig::default();
        // slope 0.02, head offset 0.0
        assert_eq!(classify(&body(0.5, 0.52, 0.51), &config), PostureState::Slumped);
        // slope 0.08 wins regardless of head offset
        assert_eq!(classify(&body(0.5, 0.58, 0.54), &config), PostureState::Tilted);
        assert_eq!(classify(&body(0.5, 0.58, 0.1), &config), PostureState::Tilted);
        // head well above the shoulders
        assert_eq!(classify(&upright(), &config), PostureState::Upright);
        assert_eq!(classify(&upright()[..32], &config), PostureState::Absent);
    }

    #[test]
    fn sustained_tilt_alerts_exactly_once() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        let mut raised = 0;
        for i in 0..=30 {
            let report = monitor.observe(&tilted(), start + secs(i as f64));
            if report.alert_raised {
                raised += 1;
                assert_eq!(i, 20);
                assert_eq!(report.alert.as_ref().unwrap().trigger, PostureState::Tilted);
            }
        }
        assert_eq!(raised, 1);
        assert!(monitor.alert().is_some());
    }

    #[test]
    fn alert_message_follows_the_triggering_state() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        monitor.observe(&tilted(), start);
        let report = monitor.observe(&slumped(), start + secs(21.0));
        assert!(report.alert_raised);
        let alert = report.alert.unwrap();
        assert_eq!(alert.trigger, PostureState::Slumped);
        assert!(alert.message.contains("slumped"));
    }

    #[test]
    fn upright_before_twenty_seconds_resets_the_streak() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        monitor.observe(&tilted(), start);
        monitor.observe(&tilted(), start + secs(15.0));
        assert_eq!(monitor.bad_streak(), secs(15.0));

        monitor.observe(&upright(), start + secs(16.0));
        assert_eq!(monitor.bad_streak(), Duration::ZERO);

        monitor.observe(&tilted(), start + secs(17.0));
        let report = monitor.observe(&tilted(), start + secs(30.0));
        assert!(!report.alert_raised);
        assert!((report.bad_streak_secs - 13.0).abs() < 1e-9);
    }

    #[test]
    fn absent_clears_the_streak_but_not_the_alert() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        monitor.observe(&tilted(), start);
        assert!(monitor.observe(&tilted(), start + secs(20.0)).alert_raised);

        monitor.observe(&[], start + secs(21.0));
        assert_eq!(monitor.bad_streak(), Duration::ZERO);
        assert!(monitor.alert().is_some());

        monitor.observe(&tilted(), start + secs(22.0));
        assert!(!monitor.observe(&tilted(), start + secs(45.0)).alert_raised);

        monitor.observe(&upright(), start + secs(46.0));
        assert!(monitor.alert().is_none());
    }

    #[test]
    fn transitions_credit_the_previous_state() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        monitor.observe(&upright(), start);
        monitor.observe(&upright(), start + secs(4.0));
        monitor.observe(&slumped(), start + secs(5.0));
        monitor.observe(&[], start + secs(8.0));

        let durations = monitor.durations();
        assert!((durations.upright - 5.0).abs() < 1e-9);
        assert!((durations.slumped - 3.0).abs() < 1e-9);
        assert_eq!(durations.absent, 0.0);

        let totals = monitor.finish(start + secs(10.0));
        assert!((totals.absent - 2.0).abs() < 1e-9);
        assert!((totals.total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn paused_time_is_not_credited() {
        let mut monitor = PostureMonitor::default();
        let start = Instant::now();
        monitor.observe(&tilted(), start);
        monitor.observe(&tilted(), start + secs(10.0));
        monitor.pause(start + secs(10.0));

        monitor.resume(start + secs(100.0));
        let report = monitor.observe(&tilted(), start + secs(101.0));
        assert!(!report.alert_raised);
        assert!((report.bad_streak_secs - 10.0).abs() < 1e-9);

        let totals = monitor.finish(start + secs(105.0));
        assert!((totals.tilted - 15.0).abs() < 1e-9);
    }
}
