pub mod aggregator;
pub mod config;
pub mod limbs;
pub mod matcher;
pub mod motion;
pub mod similarity;

pub use aggregator::{LimbScore, ScoreReport, SessionScorer};
pub use config::{MotionGuard, ScoringConfig, SimilarityStrategy};
pub use limbs::{select_limbs, BodyRegion, Joints, LimbSpec};
pub use matcher::{match_frame, ReferenceTrack};
pub use motion::MotionSummary;
pub use similarity::SimilarityScorer;
