use std::path::Path;

use archivist_core::EncoderBackend;
use tracing::{debug, info};

use crate::TranscodeError;
use crate::policy::EncodingPolicy;

/// Denoise, fill 640x480 (4:3 untouched, wider sources cropped), square pixels.
pub const FILTER_CHAIN: &str = "hqdn3d=1.2:1.2:3:3,scale=640:480:force_original_aspect_ratio=increase,crop=640:480,setsar=1";

pub const VIDEO_BITRATE: &str = "700k";
pub const VIDEO_MAXRATE: &str = "900k";
pub const VIDEO_BUFSIZE: &str = "1800k";
pub const AUDIO_BITRATE: &str = "96k";
pub const AUDIO_SAMPLE_RATE: &str = "48000";

/// Container forced with `-f`, independent of the output file's extension.
pub const CONTAINER_FORMAT: &str = "matroska";

/// Lines of ffmpeg stderr kept in a failure diagnostic.
const STDERR_TAIL_LINES: usize = 20;

/// Everything needed to build one ffmpeg invocation.
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub policy: &'a EncodingPolicy,
    pub backend: EncoderBackend,
}

/// Build the full ffmpeg argument list (without the program name).
pub fn build_args(req: &EncodeRequest<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostats".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
    ];

    args.extend(["-i".into(), req.input.to_string_lossy().into_owned()]);

    // Streams: first video, first audio if any, no subtitles
    args.extend([
        "-sn".into(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "0:a:0?".into(),
        "-vf".into(),
        FILTER_CHAIN.into(),
    ]);

    // Frame rate and GOP
    args.extend([
        "-r".into(),
        req.policy.mode.rate_arg().into(),
        "-g".into(),
        req.policy.gop.to_string(),
        "-keyint_min".into(),
        req.policy.keyint_min.to_string(),
        "-sc_threshold".into(),
        "0".into(),
    ]);

    args.extend([
        "-b:v".into(),
        VIDEO_BITRATE.into(),
        "-maxrate".into(),
        VIDEO_MAXRATE.into(),
        "-bufsize".into(),
        VIDEO_BUFSIZE.into(),
    ]);

    // Audio: AAC stereo
    args.extend([
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        AUDIO_BITRATE.into(),
        "-ac".into(),
        "2".into(),
        "-ar".into(),
        AUDIO_SAMPLE_RATE.into(),
    ]);

    args.extend(["-f".into(), CONTAINER_FORMAT.into()]);

    args.extend(["-c:v".into(), req.backend.encoder_name().into()]);
    args.extend(encoder_flags(req.backend).iter().map(|s| s.to_string()));

    args.push(req.output.to_string_lossy().into_owned());
    args
}

/// Backend-specific flags following `-c:v <encoder>`.
pub fn encoder_flags(backend: EncoderBackend) -> &'static [&'static str] {
    match backend {
        EncoderBackend::Nvenc => &[
            "-preset",
            "p4",
            "-profile:v",
            "baseline",
            "-bf",
            "0",
            "-refs",
            "1",
            "-rc",
            "vbr",
            "-rc-lookahead",
            "0",
        ],
        EncoderBackend::VideoToolbox => &["-profile:v", "baseline"],
        EncoderBackend::Software => &[
            "-preset",
            "veryfast",
            "-tune",
            "fastdecode",
            "-profile:v",
            "baseline",
            "-level",
            "3.0",
            "-pix_fmt",
            "yuv420p",
            "-x264-params",
            "bframes=0:ref=1:cabac=0:weightp=0",
        ],
    }
}

/// Render a command line for logs and dry runs. Arguments with spaces are quoted.
pub fn render(program: &Path, args: &[String]) -> String {
    std::iter::once(program.to_string_lossy().into_owned())
        .chain(args.iter().cloned())
        .map(|a| {
            if a.is_empty() || a.contains(char::is_whitespace) {
                format!("'{}'", a.replace('\'', r"'\''"))
            } else {
                a
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run ffmpeg to completion.
///
/// A non-zero exit becomes [`TranscodeError::FfmpegFailed`] carrying the tail of
/// ffmpeg's stderr; the caller decides whether that ends the run.
pub async fn run_ffmpeg(ffmpeg_path: &Path, args: &[String]) -> Result<(), TranscodeError> {
    debug!(command = %render(ffmpeg_path, args), "running ffmpeg");
    let started = std::time::Instant::now();

    let output = tokio::process::Command::new(ffmpeg_path)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .output()
        .await
        .map_err(|e| TranscodeError::Spawn {
            binary: ffmpeg_path.to_path_buf(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(TranscodeError::FfmpegFailed {
            status: output.status.to_string(),
            stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
        });
    }

    info!(elapsed_secs = started.elapsed().as_secs(), "ffmpeg finished");
    Ok(())
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
