use std::sync::Arc;

use serde::Serialize;

use crate::error::ScoreError;
use crate::models::Frame;
use crate::reference::ReferenceStore;

use super::config::ScoringConfig;
use super::matcher::{match_frame, ReferenceTrack};
use super::motion::{measure_motion, MotionSummary};
use super::similarity::SimilarityScorer;

// Set to true to log scoring outcomes from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Average score of one limb over the frames where it was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimbScore {
    pub label: String,
    pub mean_score: f64,
    pub evaluated_frames: u64,
}

/// Everything the aggregator worked out for a recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub score: u8,
    /// Mean over valid frames before rounding and capping.
    pub raw_average: f64,
    pub recorded_frames: u64,
    pub matched_frames: u64,
    pub valid_frames: u64,
    pub motion: MotionSummary,
    pub motion_capped: bool,
    pub limbs: Vec<LimbScore>,
}

/// Turns a closed session recording into a 0-100 accuracy score.
pub struct SessionScorer {
    store: Arc<dyn ReferenceStore>,
    config: ScoringConfig,
    similarity: SimilarityScorer,
}

impl SessionScorer {
    pub fn new(store: Arc<dyn ReferenceStore>, config: ScoringConfig) -> Self {
        let similarity = SimilarityScorer::new(&config);
        Self {
            store,
            config,
            similarity,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Final score for the recording. Never fails: anything that prevents
    /// evaluation yields 0.
    pub async fn score(&self, recording: &[Frame], exercise_id: &str) -> u8 {
        match self.evaluate(recording, exercise_id).await {
            Ok(report) => report.score,
            Err(ScoreError::EmptyRecording) => {
                log_warn!("No frames recorded for {}; scoring 0", exercise_id);
                0
            }
            Err(err) => {
                log_warn!("Could not score {}: {}; scoring 0", exercise_id, err);
                0
            }
        }
    }

    /// Loads the reference track and scores the recording against it.
    pub async fn evaluate(
        &self,
        recording: &[Frame],
        exercise_id: &str,
    ) -> Result<ScoreReport, ScoreError> {
        if recording.is_empty() {
            return Err(ScoreError::EmptyRecording);
        }
        let frames = self.store.load(exercise_id).await?;
        let track = ReferenceTrack::new(frames);
        Ok(self.evaluate_against(recording, &track, exercise_id))
    }

    /// Scores the recording against an already loaded reference track.
    pub fn evaluate_against(
        &self,
        recording: &[Frame],
        reference: &ReferenceTrack,
        exercise_id: &str,
    ) -> ScoreReport {
        let limbs = self.similarity.limbs_for(exercise_id);

        let mut total = 0.0;
        let mut matched_frames = 0u64;
        let mut valid_frames = 0u64;
        let mut limb_totals = vec![(0.0f64, 0u64); limbs.len()];

        for user_frame in recording {
            let Some(reference_frame) =
                match_frame(user_frame, reference, self.config.match_tolerance_secs)
            else {
                continue;
            };
            matched_frames += 1;

            let Some(frame_score) = self.similarity.score_frame(user_frame, reference_frame, limbs)
            else {
                continue;
            };

            total += frame_score.mean;
            valid_frames += 1;
            for (index, score) in frame_score.limbs {
                limb_totals[index].0 += score;
                limb_totals[index].1 += 1;
            }
        }

        let motion = measure_motion(recording, limbs, self.config.visibility_threshold);

        let raw_average = if valid_frames > 0 {
            total / valid_frames as f64
        } else {
            0.0
        };
        let mut score = raw_average.round().clamp(0.0, 100.0) as u8;

        let motion_capped = !motion.satisfies(&self.config.motion_guard);
        if motion_capped {
            log_info!(
                "Insufficient motion for {} (hip travel {:.3}); capping score at {}",
                exercise_id,
                motion.hip_travel,
                self.config.motion_cap
            );
            score = score.min(self.config.motion_cap);
        }

        log_debug!(
            "{}: {} recorded, {} matched, {} valid frames, average {:.2}",
            exercise_id,
            recording.len(),
            matched_frames,
            valid_frames,
            raw_average
        );
        log_info!("Final score for {}: {}", exercise_id, score);

        let limbs = limbs
            .iter()
            .zip(limb_totals)
            .map(|(limb, (sum, count))| LimbScore {
                label: limb.label.to_string(),
                mean_score: if count > 0 { sum / count as f64 } else { 0.0 },
                evaluated_frames: count,
            })
            .collect();

        ScoreReport {
            score,
            raw_average,
            recorded_frames: recording.len() as u64,
            matched_frames,
            valid_frames,
            motion,
            motion_capped,
            limbs,
        }
    }
}
