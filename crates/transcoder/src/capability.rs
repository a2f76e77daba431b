//! Hardware encoder detection.
//!
//! Queries `ffmpeg -encoders` once and combines the listing with host checks:
//! NVENC also needs a working `nvidia-smi`, VideoToolbox only exists on macOS.

use std::path::Path;

use archivist_core::EncoderBackend;
use serde::Serialize;
use tracing::info;

use crate::TranscoderConfig;

/// Hardware encoding paths usable on this host. Computed once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub nvenc: bool,
    pub videotoolbox: bool,
}

impl Capabilities {
    /// No hardware paths; every file is encoded with libx264.
    pub fn software_only() -> Self {
        Self::default()
    }

    /// Pick the preferred backend: NVENC, then VideoToolbox, then software.
    pub fn best(&self) -> EncoderBackend {
        if self.nvenc {
            EncoderBackend::Nvenc
        } else if self.videotoolbox {
            EncoderBackend::VideoToolbox
        } else {
            EncoderBackend::Software
        }
    }
}

/// Detect hardware encoders for the OS this binary runs on.
pub async fn detect(config: &TranscoderConfig) -> Capabilities {
    detect_for_os(config, std::env::consts::OS).await
}

/// Detection with the host OS supplied by the caller (`std::env::consts::OS` values).
pub async fn detect_for_os(config: &TranscoderConfig, os: &str) -> Capabilities {
    let encoders = match get_encoders(&config.ffmpeg_path).await {
        Ok(s) => s,
        Err(e) => {
            info!(error = %e, "could not query ffmpeg encoders, assuming software only");
            return Capabilities::software_only();
        }
    };

    let nvenc = encoders.contains("h264_nvenc") && vendor_tool_ok(&config.nvidia_smi_path).await;
    let videotoolbox = os == "macos" && encoders.contains("h264_videotoolbox");

    let caps = Capabilities {
        nvenc,
        videotoolbox,
    };
    info!(?caps, backend = %caps.best(), "hardware encoder detection complete");
    caps
}

async fn get_encoders(ffmpeg_path: &Path) -> Result<String, String> {
    let output = tokio::process::Command::new(ffmpeg_path)
        .args(["-hide_banner", "-encoders"])
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| format!("spawn ffmpeg: {e}"))?;

    if !output.status.success() {
        return Err("ffmpeg -encoders failed".into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether the GPU vendor's management utility runs and exits cleanly.
async fn vendor_tool_ok(path: &Path) -> bool {
    match tokio::process::Command::new(path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            info!(tool = %path.display(), error = %e, "GPU management utility unavailable");
            false
        }
    }
}
