pub mod loader;
pub mod recorder;

pub use loader::{reference_file_name, FileReferenceStore, MemoryReferenceStore, ReferenceStore};
pub use recorder::ReferenceRecorder;
