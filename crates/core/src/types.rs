use serde::{Deserialize, Serialize};

/// Canonical output filename base (no extension), e.g. `s02e05` or `my_series_e007`.
///
/// [`Stem::new`] rejects anything that is not lowercase alphanumerics and
/// underscores, or that is too long to leave room for the `.mkv.part`
/// suffix, so a stem is always safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Stem(String);

impl Stem {
    /// Longest stem in bytes; `<stem>.mkv.part` stays under the usual
    /// 255-byte file name limit.
    pub const MAX_LEN: usize = 240;

    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let safe = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .chars()
                .all(|c| c == '_' || (c.is_alphanumeric() && !c.is_uppercase()));
        if safe { Some(Self(raw)) } else { None }
    }

    /// Placeholder for names that normalize to nothing.
    pub fn untitled() -> Self {
        Self("untitled".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the finished output artifact.
    pub fn output_file_name(&self) -> String {
        format!("{}.mkv", self.0)
    }

    /// File name the engine writes to before the artifact is complete.
    pub fn partial_file_name(&self) -> String {
        format!("{}.mkv.part", self.0)
    }
}

impl std::fmt::Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Video encoder backend requested from ffmpeg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderBackend {
    Nvenc,
    VideoToolbox,
    Software,
}

impl EncoderBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nvenc => "nvenc",
            Self::VideoToolbox => "videotoolbox",
            Self::Software => "software",
        }
    }

    /// ffmpeg encoder name passed to `-c:v`.
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::Nvenc => "h264_nvenc",
            Self::VideoToolbox => "h264_videotoolbox",
            Self::Software => "libx264",
        }
    }

}

impl std::fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file processing state, attached to log events as the `state` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Discovered,
    Skipped,
    Classified,
    Probed,
    PolicySelected,
    Encoding,
    Done,
    Failed,
    SourceDeleted,
}

impl FileState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Skipped => "skipped",
            Self::Classified => "classified",
            Self::Probed => "probed",
            Self::PolicySelected => "policy_selected",
            Self::Encoding => "encoding",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::SourceDeleted => "source_deleted",
        }
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
