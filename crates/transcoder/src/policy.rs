use serde::{Deserialize, Serialize};

/// 24000/1001, the NTSC film rate.
pub const FILM_FPS: f64 = 24000.0 / 1001.0;
pub const PAL_FPS: f64 = 25.0;

/// Output frame-rate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRateMode {
    Pal25,
    Film23976,
}

impl FrameRateMode {
    /// Value passed to ffmpeg's `-r`.
    pub fn rate_arg(self) -> &'static str {
        match self {
            Self::Pal25 => "25",
            Self::Film23976 => "24000/1001",
        }
    }

    /// GOP length: two seconds of frames.
    pub fn gop(self) -> u32 {
        match self {
            Self::Pal25 => 50,
            Self::Film23976 => 48,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pal25 => "25",
            Self::Film23976 => "23.976",
        }
    }
}

/// Frame-rate and keyframe parameters chosen for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingPolicy {
    pub mode: FrameRateMode,
    pub gop: u32,
    pub keyint_min: u32,
    /// Probed rate and chosen target, e.g. `29.970->25` or `fallback->25`.
    pub reason: String,
}

impl EncodingPolicy {
    fn for_mode(mode: FrameRateMode, reason: String) -> Self {
        Self {
            mode,
            gop: mode.gop(),
            keyint_min: mode.gop(),
            reason,
        }
    }
}

/// Pick the output mode closest to the probed source rate.
///
/// Unknown rates (`<= 0` or NaN) fall back to 25 fps. Exactly halfway between
/// the two targets also resolves to 25 fps.
pub fn select(src_fps: f64) -> EncodingPolicy {
    if src_fps.is_nan() || src_fps <= 0.0 {
        return EncodingPolicy::for_mode(FrameRateMode::Pal25, "fallback->25".into());
    }

    let mode = if (src_fps - PAL_FPS).abs() <= (src_fps - FILM_FPS).abs() {
        FrameRateMode::Pal25
    } else {
        FrameRateMode::Film23976
    };

    EncodingPolicy::for_mode(mode, format!("{src_fps:.3}->{}", mode.label()))
}
