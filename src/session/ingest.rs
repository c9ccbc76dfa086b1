use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::Frame;

use super::controller::SessionController;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Per-frame debug output, switched on with `FORMCHECK_DEBUG=1`.
pub fn debug_frames_enabled() -> bool {
    std::env::var("FORMCHECK_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Drains the producer's channel into the controller until cancelled or the
/// producer goes away. Dropping `frames` on exit releases the producer.
pub async fn ingest_loop(
    session_id: String,
    mut frames: mpsc::Receiver<Frame>,
    controller: SessionController,
    cancel_token: CancellationToken,
) {
    let debug = debug_frames_enabled();
    let mut received: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("ingest loop for session {} shutting down after {} frames", session_id, received);
                break;
            }
            next = frames.recv() => {
                let Some(frame) = next else {
                    log_info!("frame producer for session {} closed after {} frames", session_id, received);
                    break;
                };
                received += 1;
                let timestamp = frame.timestamp;
                let outcome = controller.handle_frame(frame, Instant::now()).await;
                if debug {
                    match outcome {
                        Some(outcome) => log_debug!(
                            "frame {} t={:.3}s recorded={:?} posture={}",
                            received,
                            timestamp,
                            outcome.recorded,
                            outcome.posture.label
                        ),
                        None => log_debug!("frame {} t={:.3}s ignored (session not active)", received, timestamp),
                    }
                }
            }
        }
    }
}
