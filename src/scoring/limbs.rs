use serde::Serialize;

use crate::models::landmark::{
    LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ANKLE,
    RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};

use super::config::SimilarityStrategy;

/// Landmark indices that make up one comparison unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Joints {
    /// Direction from the first joint to the second.
    Segment(usize, usize),
    /// Angle at the middle joint.
    Angle(usize, usize, usize),
}

impl Joints {
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            Joints::Segment(a, b) => vec![a, b],
            Joints::Angle(a, b, c) => vec![a, b, c],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimbSpec {
    pub label: &'static str,
    pub joints: Joints,
}

const fn segment(label: &'static str, a: usize, b: usize) -> LimbSpec {
    LimbSpec {
        label,
        joints: Joints::Segment(a, b),
    }
}

const fn angle(label: &'static str, a: usize, b: usize, c: usize) -> LimbSpec {
    LimbSpec {
        label,
        joints: Joints::Angle(a, b, c),
    }
}

const LOWER_BODY_SEGMENTS: [LimbSpec; 5] = [
    segment("left thigh", LEFT_HIP, LEFT_KNEE),
    segment("right thigh", RIGHT_HIP, RIGHT_KNEE),
    segment("left shin", LEFT_KNEE, LEFT_ANKLE),
    segment("right shin", RIGHT_KNEE, RIGHT_ANKLE),
    segment("spine", LEFT_SHOULDER, LEFT_HIP),
];

const UPPER_BODY_SEGMENTS: [LimbSpec; 5] = [
    segment("left upper arm", LEFT_SHOULDER, LEFT_ELBOW),
    segment("right upper arm", RIGHT_SHOULDER, RIGHT_ELBOW),
    segment("left forearm", LEFT_ELBOW, LEFT_WRIST),
    segment("right forearm", RIGHT_ELBOW, RIGHT_WRIST),
    segment("torso", LEFT_SHOULDER, LEFT_HIP),
];

const FULL_BODY_SEGMENTS: [LimbSpec; 4] = [
    segment("left thigh", LEFT_HIP, LEFT_KNEE),
    segment("right thigh", RIGHT_HIP, RIGHT_KNEE),
    segment("left upper arm", LEFT_SHOULDER, LEFT_ELBOW),
    segment("right upper arm", RIGHT_SHOULDER, RIGHT_ELBOW),
];

const LOWER_BODY_ANGLES: [LimbSpec; 5] = [
    angle("left knee", LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
    angle("right knee", RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
    angle("left hip", LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE),
    angle("right hip", RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE),
    angle("back", LEFT_SHOULDER, LEFT_HIP, LEFT_ANKLE),
];

const UPPER_BODY_ANGLES: [LimbSpec; 5] = [
    angle("left elbow", LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
    angle("right elbow", RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
    angle("left shoulder", LEFT_ELBOW, LEFT_SHOULDER, LEFT_HIP),
    angle("right shoulder", RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_HIP),
    angle("torso", LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE),
];

const FULL_BODY_ANGLES: [LimbSpec; 4] = [
    angle("left knee", LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
    angle("right knee", RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
    angle("left elbow", LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
    angle("right elbow", RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
];

const LOWER_BODY_KEYWORDS: [&str; 3] = ["squat", "lunge", "lower"];
const UPPER_BODY_KEYWORDS: [&str; 4] = ["pushup", "press", "upper", "curl"];

/// Which part of the body an exercise is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyRegion {
    LowerBody,
    UpperBody,
    FullBody,
}

impl BodyRegion {
    /// Keyword match on the lowercased identifier. Lower-body keywords win.
    pub fn for_exercise(exercise_id: &str) -> Self {
        let name = exercise_id.to_lowercase();
        if LOWER_BODY_KEYWORDS.iter().any(|k| name.contains(k)) {
            BodyRegion::LowerBody
        } else if UPPER_BODY_KEYWORDS.iter().any(|k| name.contains(k)) {
            BodyRegion::UpperBody
        } else {
            BodyRegion::FullBody
        }
    }

    pub fn limbs(self, strategy: SimilarityStrategy) -> &'static [LimbSpec] {
        match (self, strategy) {
            (BodyRegion::LowerBody, SimilarityStrategy::Cosine) => &LOWER_BODY_SEGMENTS,
            (BodyRegion::UpperBody, SimilarityStrategy::Cosine) => &UPPER_BODY_SEGMENTS,
            (BodyRegion::FullBody, SimilarityStrategy::Cosine) => &FULL_BODY_SEGMENTS,
            (BodyRegion::LowerBody, SimilarityStrategy::Angle) => &LOWER_BODY_ANGLES,
            (BodyRegion::UpperBody, SimilarityStrategy::Angle) => &UPPER_BODY_ANGLES,
            (BodyRegion::FullBody, SimilarityStrategy::Angle) => &FULL_BODY_ANGLES,
        }
    }
}

/// Limbs evaluated for `exercise_id` under the given comparison strategy.
pub fn select_limbs(exercise_id: &str, strategy: SimilarityStrategy) -> &'static [LimbSpec] {
    BodyRegion::for_exercise(exercise_id).limbs(strategy)
}
