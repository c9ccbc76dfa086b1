pub mod controller;
pub mod events;
pub mod ingest;
pub mod state;

pub use controller::SessionController;
pub use events::SessionEvent;
pub use state::{SessionPhase, SessionSnapshot};
