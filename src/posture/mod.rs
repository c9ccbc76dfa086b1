pub mod config;
pub mod monitor;
pub mod state;

pub use config::PostureConfig;
pub use monitor::{classify, PostureMonitor};
pub use state::{PostureAlert, PostureDurations, PostureReport, PostureState};
