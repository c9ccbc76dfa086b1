pub mod landmark;
pub mod session;

pub use landmark::{Frame, Landmark, LANDMARK_COUNT};
pub use session::{Session, SessionStatus, SessionSummary};
