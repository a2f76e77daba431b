use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TranscodeError;

/// Summary of a media file, as reported by ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub container: String,
    pub duration_secs: f64,
    pub video: Option<VideoStream>,
    pub audio: Vec<AudioStream>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStream {
    pub index: u32,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    /// Frame rate in fps; 0.0 when unknown.
    pub framerate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStream {
    pub index: u32,
    pub codec: String,
    pub channels: u32,
    pub language: Option<String>,
}

/// Native frame rate of the first video stream, or 0.0 when it cannot be determined.
///
/// Never fails: a missing ffprobe, a non-zero exit or unparseable output all
/// degrade to the 0.0 sentinel.
pub async fn probe_frame_rate(ffprobe_path: &Path, file: &Path) -> f64 {
    let output = tokio::process::Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=avg_frame_rate",
            "-of",
            "default=nk=1:nw=1",
        ])
        .arg(file)
        .stdin(std::process::Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            debug!(file = %file.display(), error = %e, "ffprobe could not be started");
            return 0.0;
        }
    };

    if !output.status.success() {
        debug!(file = %file.display(), status = %output.status, "ffprobe failed");
        return 0.0;
    }

    parse_rate(String::from_utf8_lossy(&output.stdout).trim())
}

/// Parse `num/den` or a plain decimal. Empty, `0/0` and malformed input give 0.0.
pub fn parse_rate(s: &str) -> f64 {
    let rate = if let Some((num, den)) = s.split_once('/') {
        match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(n), Ok(d)) if d != 0.0 => n / d,
            _ => 0.0,
        }
    } else {
        s.parse::<f64>().unwrap_or(0.0)
    };
    if rate.is_finite() { rate } else { 0.0 }
}

/// Run ffprobe in JSON mode on a file and summarize the result.
pub async fn probe(ffprobe_path: &Path, file: &Path) -> Result<MediaInfo, TranscodeError> {
    let output = tokio::process::Command::new(ffprobe_path)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(file)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| TranscodeError::Spawn {
            binary: ffprobe_path.to_path_buf(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscodeError::ProbeFailed(format!(
            "{} ({})",
            output.status,
            stderr.trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

/// Subset of `ffprobe -print_format json -show_format -show_streams` we read.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeFormat {
    format_name: Option<String>,
    // ffprobe reports numbers as strings here
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeStream {
    index: u32,
    codec_type: String,
    codec_name: Option<String>,
    width: u32,
    height: u32,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    channels: Option<u32>,
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeTags {
    language: Option<String>,
}

impl ProbeStream {
    /// `avg_frame_rate` is `0/0` for some containers; fall back to `r_frame_rate`.
    fn framerate(&self) -> f64 {
        [&self.avg_frame_rate, &self.r_frame_rate]
            .into_iter()
            .flatten()
            .map(|r| parse_rate(r))
            .find(|fps| *fps > 0.0)
            .unwrap_or(0.0)
    }

    fn codec(&self) -> String {
        self.codec_name.clone().unwrap_or_else(|| "unknown".into())
    }
}

fn parse_probe_output(raw: &[u8]) -> Result<MediaInfo, TranscodeError> {
    let parsed: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|e| TranscodeError::ProbeFailed(format!("parse JSON: {e}")))?;
    let format = parsed
        .format
        .ok_or_else(|| TranscodeError::ProbeFailed("missing 'format'".into()))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .map(|s| VideoStream {
            index: s.index,
            codec: s.codec(),
            width: s.width,
            height: s.height,
            framerate: s.framerate(),
        });

    let audio = parsed
        .streams
        .iter()
        .filter(|s| s.codec_type == "audio")
        .map(|s| AudioStream {
            index: s.index,
            codec: s.codec(),
            channels: s.channels.unwrap_or(2),
            language: s.tags.language.clone(),
        })
        .collect();

    Ok(MediaInfo {
        container: format.format_name.unwrap_or_else(|| "unknown".into()),
        duration_secs: format
            .duration
            .and_then(|d| d.parse().ok())
            .unwrap_or(0.0),
        video,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_probe_json() {
        let json = serde_json::json!({
            "format": {
                "format_name": "matroska,webm",
                "duration": "1320.5"
            },
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "avg_frame_rate": "0/0",
                    "r_frame_rate": "24000/1001"
                },
                {
                    "index": 1,
                    "codec_type": "audio",
                    "codec_name": "ac3",
                    "channels": 6,
                    "tags": { "language": "spa" }
                },
                {
                    "index": 2,
                    "codec_type": "subtitle",
                    "codec_name": "subrip"
                }
            ]
        });

        let info = parse_probe_output(json.to_string().as_bytes()).unwrap();
        assert_eq!(info.container, "matroska,webm");
        assert!((info.duration_secs - 1320.5).abs() < 0.001);

        let v = info.video.unwrap();
        assert_eq!(v.codec, "h264");
        assert_eq!((v.width, v.height), (1920, 1080));
        assert!((v.framerate - 23.976).abs() < 0.01);

        assert_eq!(info.audio.len(), 1);
        assert_eq!(info.audio[0].channels, 6);
        assert_eq!(info.audio[0].language.as_deref(), Some("spa"));
    }

    #[test]
    fn missing_format_is_an_error() {
        for raw in [r#"{ "streams": [] }"#, "not json"] {
            assert!(matches!(
                parse_probe_output(raw.as_bytes()),
                Err(TranscodeError::ProbeFailed(_))
            ));
        }
    }

    #[test]
    fn audio_only_file_has_no_video() {
        let raw = r#"{
            "format": { "format_name": "mp3" },
            "streams": [ { "index": 0, "codec_type": "audio", "codec_name": "mp3" } ]
        }"#;
        let info = parse_probe_output(raw.as_bytes()).unwrap();
        assert!(info.video.is_none());
        assert_eq!(info.duration_secs, 0.0);
        assert_eq!(info.audio[0].channels, 2);
        assert_eq!(info.audio[0].language, None);
    }

    #[test]
    fn parse_rate_handles_fractions_and_markers() {
        assert!((parse_rate("24000/1001") - 23.976).abs() < 0.001);
        assert!((parse_rate("25/1") - 25.0).abs() < f64::EPSILON);
        assert!((parse_rate("29.97") - 29.97).abs() < f64::EPSILON);
        assert_eq!(parse_rate("0/0"), 0.0);
        assert_eq!(parse_rate("30/0"), 0.0);
        assert_eq!(parse_rate(""), 0.0);
        assert_eq!(parse_rate("N/A"), 0.0);
        assert_eq!(parse_rate("inf"), 0.0);
    }

    #[tokio::test]
    async fn missing_ffprobe_degrades_to_zero() {
        let fps = probe_frame_rate(
            Path::new("/nonexistent/archivist-ffprobe"),
            Path::new("/nonexistent/video.mkv"),
        )
        .await;
        assert_eq!(fps, 0.0);
    }
}
