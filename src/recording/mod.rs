pub mod buffer;

pub use buffer::LandmarkBuffer;
