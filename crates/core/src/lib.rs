pub mod error;
pub mod types;

pub use error::BatchError;
pub use types::{EncoderBackend, FileState, Stem};
