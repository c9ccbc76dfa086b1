use serde::Serialize;

use crate::models::SessionSummary;
use crate::posture::{PostureAlert, PostureReport};

use super::state::SessionSnapshot;

/// Notifications published to subscribers of a [`super::SessionController`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    PostureUpdated(PostureReport),
    PostureAlert(PostureAlert),
    SessionCompleted(SessionSummary),
}
