use crate::models::Frame;

/// Reference frames indexed by playback timestamp.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTrack {
    frames: Vec<Frame>,
}

impl ReferenceTrack {
    pub fn new(mut frames: Vec<Frame>) -> Self {
        frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame closest in time to `timestamp`, with its distance.
    /// On a tie the earlier frame wins.
    pub fn nearest(&self, timestamp: f64) -> Option<(&Frame, f64)> {
        let idx = self.frames.partition_point(|f| f.timestamp < timestamp);

        let before = idx
            .checked_sub(1)
            .and_then(|i| self.frames.get(i))
            .map(|f| (f, (timestamp - f.timestamp).abs()));
        let after = self
            .frames
            .get(idx)
            .map(|f| (f, (f.timestamp - timestamp).abs()));

        match (before, after) {
            (Some(b), Some(a)) => Some(if a.1 < b.1 { a } else { b }),
            (b, a) => b.or(a),
        }
    }

    /// The nearest frame if it lies strictly within `tolerance` seconds.
    pub fn match_timestamp(&self, timestamp: f64, tolerance: f64) -> Option<&Frame> {
        self.nearest(timestamp)
            .filter(|(_, delta)| *delta < tolerance)
            .map(|(frame, _)| frame)
    }
}

/// Pairs a user frame with its reference frame, if one is close enough in time.
pub fn match_frame<'a>(
    user: &Frame,
    reference: &'a ReferenceTrack,
    tolerance: f64,
) -> Option<&'a Frame> {
    reference.match_timestamp(user.timestamp, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(timestamps: &[f64]) -> ReferenceTrack {
        ReferenceTrack::new(
            timestamps
                .iter()
                .map(|&t| Frame::new(t, Vec::new()))
                .collect(),
        )
    }

    #[test]
    fn picks_the_closest_candidate_within_tolerance() {
        let t = 3.0;
        let reference = track(&[t + 0.2, t - 0.11, t - 0.05]);
        let user = Frame::new(t, Vec::new());
        let matched = match_frame(&user, &reference, 0.1).unwrap();
        assert!((matched.timestamp - (t - 0.05)).abs() < 1e-9);
    }

    #[test]
    fn no_match_when_everything_is_too_far() {
        let t = 3.0;
        let reference = track(&[t - 0.11, t + 0.2]);
        assert!(reference.match_timestamp(t, 0.1).is_none());
        assert!(ReferenceTrack::default().match_timestamp(t, 0.1).is_none());
    }

    #[test]
    fn handles_timestamps_outside_the_track() {
        let reference = track(&[1.0, 2.0, 3.0]);
        assert_eq!(reference.nearest(-5.0).unwrap().0.timestamp, 1.0);
        assert_eq!(reference.nearest(9.0).unwrap().0.timestamp, 3.0);
        assert_eq!(reference.match_timestamp(3.05, 0.1).unwrap().timestamp, 3.0);
    }

    #[test]
    fn ties_resolve_to_the_earlier_frame() {
        let reference = track(&[1.0, 2.0]);
        assert_eq!(reference.nearest(1.5).unwrap().0.timestamp, 1.0);
    }
}
