use serde::Serialize;

use crate::models::{Frame, Landmark};

use super::config::{ScoringConfig, SimilarityStrategy};
use super::limbs::{select_limbs, Joints, LimbSpec};

/// Cosine similarity of two 2D vectors; 0 when either has zero length.
pub fn cosine_similarity(u: (f64, f64), v: (f64, f64)) -> f64 {
    let dot = u.0 * v.0 + u.1 * v.1;
    let mag_u = (u.0 * u.0 + u.1 * u.1).sqrt();
    let mag_v = (v.0 * v.0 + v.1 * v.1).sqrt();
    if mag_u == 0.0 || mag_v == 0.0 {
        return 0.0;
    }
    dot / (mag_u * mag_v)
}

/// Angle in degrees between two direction vectors, in `[0, 180]`.
pub fn cosine_deviation(u: (f64, f64), v: (f64, f64)) -> f64 {
    cosine_similarity(u, v).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Interior angle at `b` in degrees, in `[0, 180]`.
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}

/// Maps an angular deviation onto 0-100: `100 * exp(-d^2 / sensitivity)`,
/// with anything under `floor` zeroed.
pub fn score_from_deviation(deviation: f64, sensitivity: f64, floor: f64) -> f64 {
    let raw = 100.0 * (-(deviation * deviation) / sensitivity).exp();
    if raw < floor {
        0.0
    } else {
        raw
    }
}

fn vector(from: &Landmark, to: &Landmark) -> (f64, f64) {
    (to.x - from.x, to.y - from.y)
}

/// Orientation of a limb within one frame: the segment's direction (degrees
/// from the +x axis) or the joint's interior angle.
pub fn limb_measure(frame: &Frame, joints: Joints) -> Option<f64> {
    match joints {
        Joints::Segment(a, b) => {
            let (dx, dy) = vector(frame.landmark(a)?, frame.landmark(b)?);
            Some(dy.atan2(dx).to_degrees())
        }
        Joints::Angle(a, b, c) => Some(joint_angle(
            frame.landmark(a)?,
            frame.landmark(b)?,
            frame.landmark(c)?,
        )),
    }
}

/// Whether every joint of the limb clears the visibility threshold in `frame`.
/// `None` if the frame lacks one of the joints.
pub fn limb_visible(frame: &Frame, joints: Joints, threshold: f64) -> Option<bool> {
    let mut visible = true;
    for index in joints.indices() {
        visible &= frame.landmark(index)?.visibility >= threshold;
    }
    Some(visible)
}

/// Per-frame result: mean over the evaluated limbs plus each limb's share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameScore {
    pub mean: f64,
    /// `(limb index in the selected set, score)`, hidden limbs as 0.
    pub limbs: Vec<(usize, f64)>,
}

/// Compares user limbs with reference limbs under one configured strategy.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    strategy: SimilarityStrategy,
    sensitivity: f64,
    floor: f64,
    visibility_threshold: f64,
}

impl SimilarityScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            strategy: config.strategy,
            sensitivity: config.sensitivity,
            floor: config.score_floor,
            visibility_threshold: config.visibility_threshold,
        }
    }

    pub fn limbs_for(&self, exercise_id: &str) -> &'static [LimbSpec] {
        select_limbs(exercise_id, self.strategy)
    }

    /// Angular difference between the user's and the reference's limb.
    pub fn deviation(&self, user: &Frame, reference: &Frame, joints: Joints) -> Option<f64> {
        match joints {
            Joints::Segment(a, b) => {
                let u = vector(user.landmark(a)?, user.landmark(b)?);
                let r = vector(reference.landmark(a)?, reference.landmark(b)?);
                Some(cosine_deviation(u, r))
            }
            Joints::Angle(..) => {
                let u = limb_measure(user, joints)?;
                let r = limb_measure(reference, joints)?;
                Some((u - r).abs())
            }
        }
    }

    /// Score of one limb. `None` when the limb cannot be evaluated at all;
    /// `Some(0.0)` when the user's joints are not visible enough.
    pub fn score_limb(&self, user: &Frame, reference: &Frame, limb: &LimbSpec) -> Option<f64> {
        let deviation = self.deviation(user, reference, limb.joints)?;
        if !limb_visible(user, limb.joints, self.visibility_threshold)? {
            return Some(0.0);
        }
        Some(score_from_deviation(deviation, self.sensitivity, self.floor))
    }

    /// Mean limb score for a matched frame pair; `None` if no limb could be evaluated.
    pub fn score_frame(
        &self,
        user: &Frame,
        reference: &Frame,
        limbs: &[LimbSpec],
    ) -> Option<FrameScore> {
        let scored: Vec<(usize, f64)> = limbs
            .iter()
            .enumerate()
            .filter_map(|(i, limb)| self.score_limb(user, reference, limb).map(|s| (i, s)))
            .collect();

        if scored.is_empty() {
            return None;
        }

        let mean = scored.iter().map(|(_, s)| s).sum::<f64>() / scored.len() as f64;
        Some(FrameScore {
            mean,
            limbs: scored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmark::{LEFT_ELBOW, LEFT_SHOULDER, LEFT_WRIST};
    use crate::models::LANDMARK_COUNT;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(&ScoringConfig::default())
    }

    fn frame_with(points: &[(usize, f64, f64, f64)]) -> Frame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 1.0); LANDMARK_COUNT];
        for &(i, x, y, v) in points {
            landmarks[i] = Landmark::new(x, y, v);
        }
        Frame::new(0.0, landmarks)
    }

    #[test]
    fn curve_is_100_at_zero_and_floored_below_ten() {
        assert_eq!(score_from_deviation(0.0, 200.0, 10.0), 100.0);
        // exp(-400/200) * 100 ~= 13.5
        assert!((score_from_deviation(20.0, 200.0, 10.0) - 13.533).abs() < 0.01);
        // exp(-625/200) * 100 ~= 4.4 -> zero credit
        assert_eq!(score_from_deviation(25.0, 200.0, 10.0), 0.0);
    }

    #[test]
    fn curve_never_increases_with_deviation() {
        let mut last = f64::MAX;
        for step in 0..=360 {
            let d = step as f64 * 0.5;
            let s = score_from_deviation(d, 200.0, 10.0);
            assert!((0.0..=100.0).contains(&s));
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn cosine_of_identical_and_opposite_vectors() {
        let v = (0.3, -0.4);
        assert!(cosine_deviation(v, v).abs() < 1e-6);
        assert!((cosine_deviation(v, (-0.3, 0.4)) - 180.0).abs() < 1e-6);
        assert_eq!(cosine_similarity((0.0, 0.0), v), 0.0);
        assert_eq!(score_from_deviation(180.0, 200.0, 10.0), 0.0);
    }

    #[test]
    fn joint_angle_reflects_reflex_angles() {
        let a = Landmark::new(0.0, 0.0, 1.0);
        let b = Landmark::new(0.5, 0.0, 1.0);
        let straight = Landmark::new(1.0, 0.0, 1.0);
        let bent = Landmark::new(0.5, 0.5, 1.0);
        assert!((joint_angle(&a, &b, &straight) - 180.0).abs() < 1e-9);
        assert!((joint_angle(&a, &b, &bent) - 90.0).abs() < 1e-9);

        // atan2 difference of 270 degrees folds back to 90
        let behind = Landmark::new(-0.5, 0.0, 1.0);
        let below = Landmark::new(0.5, -1.0, 1.0);
        assert!((joint_angle(&behind, &b, &below) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn hidden_joint_scores_zero_but_still_counts() {
        let reference = frame_with(&[(LEFT_SHOULDER, 0.4, 0.3, 1.0), (LEFT_ELBOW, 0.4, 0.5, 1.0)]);
        let user = frame_with(&[(LEFT_SHOULDER, 0.4, 0.3, 0.49), (LEFT_ELBOW, 0.4, 0.5, 1.0)]);

        let limbs = [
            LimbSpec {
                label: "left upper arm",
                joints: Joints::Segment(LEFT_SHOULDER, LEFT_ELBOW),
            },
            LimbSpec {
                label: "left forearm",
                joints: Joints::Segment(LEFT_ELBOW, LEFT_WRIST),
            },
        ];
        // the upper arm matches exactly but the shoulder is hidden; the forearm matches too
        let score = scorer().score_frame(&user, &reference, &limbs).unwrap();
        assert_eq!(score.limbs.len(), 2);
        assert_eq!(score.limbs[0], (0, 0.0));
        assert!((score.limbs[1].1 - 100.0).abs() < 1e-6);
        assert!((score.mean - 50.0).abs() < 1e-6);

        let visible = frame_with(&[(LEFT_SHOULDER, 0.4, 0.3, 0.5), (LEFT_ELBOW, 0.4, 0.5, 1.0)]);
        let score = scorer().score_frame(&visible, &reference, &limbs[..1]).unwrap();
        assert!((score.mean - 100.0).abs() < 1e-6);
    }

    #[test]
    fn limb_outside_the_frame_is_not_evaluated() {
        let user = Frame::new(0.0, vec![Landmark::new(0.1, 0.1, 1.0); 5]);
        let reference = frame_with(&[]);
        let limbs = scorer().limbs_for("squat");
        assert!(scorer().score_frame(&user, &reference, limbs).is_none());
    }

    #[test]
    fn angle_strategy_compares_interior_angles() {
        let config = ScoringConfig {
            strategy: SimilarityStrategy::Angle,
            ..ScoringConfig::default()
        };
        let scorer = SimilarityScorer::new(&config);
        let straight = frame_with(&[
            (LEFT_SHOULDER, 0.2, 0.5, 1.0),
            (LEFT_ELBOW, 0.4, 0.5, 1.0),
            (LEFT_WRIST, 0.6, 0.5, 1.0),
        ]);
        let bent = frame_with(&[
            (LEFT_SHOULDER, 0.2, 0.5, 1.0),
            (LEFT_ELBOW, 0.4, 0.5, 1.0),
            (LEFT_WRIST, 0.4, 0.7, 1.0),
        ]);
        let elbow = Joints::Angle(LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST);
        assert!((scorer.deviation(&straight, &bent, elbow).unwrap() - 90.0).abs() < 1e-9);
        assert!(scorer.deviation(&straight, &straight, elbow).unwrap().abs() < 1e-9);
    }
}
