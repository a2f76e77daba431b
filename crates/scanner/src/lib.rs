pub mod classify;
pub mod walk;

pub use classify::{Classification, classify};
pub use walk::{MediaEntry, walk_media_dir};
