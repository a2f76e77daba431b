pub mod capability;
pub mod command;
pub mod ffprobe;
pub mod policy;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),
    #[error("could not start {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },
    #[error("ffmpeg exited with {status}: {stderr}")]
    FfmpegFailed { status: String, stderr: String },
}

/// Locations of the external tools the transcoder drives.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Vendor utility that must run cleanly before NVENC is trusted.
    pub nvidia_smi_path: PathBuf,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            nvidia_smi_path: PathBuf::from("nvidia-smi"),
        }
    }
}
