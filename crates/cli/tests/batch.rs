//! End-to-end batch runs against stand-in ffmpeg/ffprobe scripts.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use archivist_cli::{BatchConfig, FailurePolicy, UnclassifiedPolicy, run_batch};
use archivist_core::{BatchError, EncoderBackend, FileState};
use archivist_transcoder::TranscoderConfig;
use archivist_transcoder::capability::Capabilities;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
    out: PathBuf,
    log: PathBuf,
    config: BatchConfig,
}

fn script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A library root plus fake tools: ffprobe reports `fps`, ffmpeg logs its
/// arguments, writes its last argument and fails for inputs named `*broken*`.
fn fixture(fps: &str) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("bin");
    let root = tmp.path().join("library");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&root).unwrap();

    let log = tmp.path().join("ffmpeg.log");
    let ffmpeg = bin.join("ffmpeg");
    script(
        &ffmpeg,
        &format!(
            r#"case "$*" in *broken*) echo "Invalid data found when processing input" >&2; exit 1;; esac
for last; do :; done
echo "$@" >> '{}'
printf 'mkv' > "$last""#,
            log.display()
        ),
    );
    let ffprobe = bin.join("ffprobe");
    script(&ffprobe, &format!("echo '{fps}'"));

    let config = BatchConfig {
        transcoder: TranscoderConfig {
            ffmpeg_path: ffmpeg,
            ffprobe_path: ffprobe,
            nvidia_smi_path: bin.join("nvidia-smi"),
        },
        ..BatchConfig::new(&root)
    };

    Fixture {
        out: root.join("encoded"),
        _tmp: tmp,
        root,
        log,
        config,
    }
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"video").unwrap();
}

fn invocations(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn software() -> Capabilities {
    Capabilities::software_only()
}

#[tokio::test]
async fn first_run_encodes_second_run_skips() {
    let fx = fixture("25/1");
    touch(&fx.root.join("Show.S01E01.mp4"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 1);
    assert!(fx.out.join("s01e01.mkv").is_file());
    assert!(!fx.out.join("s01e01.mkv.part").exists());
    assert!(fx.root.join("Show.S01E01.mp4").exists());
    assert_eq!(invocations(&fx.log).len(), 1);

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.files[0].state, FileState::Skipped);
    assert_eq!(invocations(&fx.log).len(), 1);
}

#[tokio::test]
async fn policy_and_backend_reach_the_command() {
    let fx = fixture("24000/1001");
    touch(&fx.root.join("Show.S02E03.mkv"));

    let both = Capabilities {
        nvenc: true,
        videotoolbox: true,
    };
    let report = run_batch(&fx.config, &both).await.unwrap();
    assert_eq!(report.backend, EncoderBackend::Nvenc);
    assert_eq!(report.files[0].policy.as_deref(), Some("23.976->23.976"));

    let calls = invocations(&fx.log);
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert!(call.contains("-r 24000/1001 -g 48 -keyint_min 48"), "{call}");
    assert!(call.contains("-c:v h264_nvenc -preset p4"), "{call}");
    assert!(!call.contains("h264_videotoolbox"), "{call}");
    assert!(!call.contains("libx264"), "{call}");
    assert!(call.ends_with("s02e03.mkv.part"), "{call}");
}

#[tokio::test]
async fn unknown_frame_rate_uses_25() {
    let fx = fixture("0/0");
    touch(&fx.root.join("Show.S01E01.mp4"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.files[0].policy.as_deref(), Some("fallback->25"));
    assert!(invocations(&fx.log)[0].contains("-r 25 -g 50 -keyint_min 50"));
}

#[tokio::test]
async fn series_numbers_and_fallback_names() {
    let fx = fixture("25");
    touch(&fx.root.join("My Series 7 - Title.mp4"));
    touch(&fx.root.join("extras").join("Holiday Special.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 2);
    assert_eq!(report.fallback_stems, 1);
    assert!(fx.out.join("my_series_e007.mkv").is_file());
    assert!(fx.out.join("holiday_special.mkv").is_file());
}

#[tokio::test]
async fn skip_unclassified_leaves_unknown_names_alone() {
    let mut fx = fixture("25");
    fx.config.unclassified = UnclassifiedPolicy::Skip;
    touch(&fx.root.join("Holiday Special.mkv"));
    touch(&fx.root.join("Show.S01E01.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 1);
    assert_eq!(report.skipped, 1);
    assert!(!fx.out.join("holiday_special.mkv").exists());
}

#[tokio::test]
async fn output_directory_is_not_scanned() {
    let fx = fixture("25");
    touch(&fx.out.join("s09e09.mkv"));
    touch(&fx.root.join("Show.S01E01.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(invocations(&fx.log).len(), 1);
}

#[tokio::test]
async fn delete_source_only_when_asked() {
    let mut fx = fixture("25");
    let kept = fx.root.join("Show.S01E01.mkv");
    touch(&kept);
    run_batch(&fx.config, &software()).await.unwrap();
    assert!(kept.exists());

    let gone = fx.root.join("Show.S01E02.mkv");
    touch(&gone);
    fx.config.delete_source = true;
    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert!(!gone.exists());
    assert!(fx.out.join("s01e02.mkv").is_file());
    assert_eq!(report.deleted, 1);
    // Already-encoded sources are never deleted.
    assert!(kept.exists());
}

#[tokio::test]
async fn failure_aborts_the_run() {
    let mut fx = fixture("25");
    fx.config.delete_source = true;
    let broken = fx.root.join("A.S01E01.broken.mkv");
    touch(&broken);
    touch(&fx.root.join("B.S01E02.mkv"));

    let err = run_batch(&fx.config, &software()).await.unwrap_err();
    match &err {
        BatchError::EncodeFailed { stem, reason, .. } => {
            assert_eq!(stem, "s01e01");
            assert!(reason.contains("Invalid data"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(broken.exists());
    assert!(!fx.out.join("s01e01.mkv").exists());
    assert!(!fx.out.join("s01e01.mkv.part").exists());
    assert!(!fx.out.join("s01e02.mkv").exists());
}

#[tokio::test]
async fn keep_going_records_failures() {
    let mut fx = fixture("25");
    fx.config.on_failure = FailurePolicy::Continue;
    touch(&fx.root.join("A.S01E01.broken.mkv"));
    touch(&fx.root.join("B.S01E02.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.encoded, 1);
    assert_eq!(report.files[0].state, FileState::Failed);
    assert!(report.files[0].error.is_some());
    assert!(fx.out.join("s01e02.mkv").is_file());
}

#[tokio::test]
async fn failed_fallback_names_are_reported_as_fallback() {
    let mut fx = fixture("25");
    fx.config.on_failure = FailurePolicy::Continue;
    touch(&fx.root.join("Holiday broken Special.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.fallback_stems, 1);
    let file = &report.files[0];
    assert_eq!(file.state, FileState::Failed);
    assert!(file.fallback);
    assert_eq!(file.stem.as_ref().unwrap().as_str(), "holiday_broken_special");
    assert_eq!(file.policy.as_deref(), Some("25.000->25"));
    assert_eq!(file.size_bytes, 5);
}

#[tokio::test]
async fn overlong_fallback_name_is_encoded() {
    let fx = fixture("25");
    touch(&fx.root.join(format!("{}.avi", "a".repeat(251))));
    touch(&fx.root.join("Show.S01E02.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 2);
    assert!(fx.out.join(format!("{}.mkv", "a".repeat(240))).is_file());
    assert!(fx.out.join("s01e02.mkv").is_file());
}

#[tokio::test]
async fn symlinked_directories_are_not_encoded_or_deleted() {
    let mut fx = fixture("25");
    fx.config.delete_source = true;
    let outside = fx.root.parent().unwrap().join("elsewhere");
    let foreign = outside.join("Other.S05E05.mkv");
    touch(&foreign);
    std::os::unix::fs::symlink(&outside, fx.root.join("linked")).unwrap();
    std::os::unix::fs::symlink(".", fx.root.join("loop")).unwrap();
    touch(&fx.root.join("Show.S01E01.mkv"));

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.encoded, 1);
    assert!(foreign.exists());
    assert!(!fx.out.join("s05e05.mkv").exists());
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let mut fx = fixture("25");
    fx.config.dry_run = true;
    fx.config.delete_source = true;
    let source = fx.root.join("Show.S01E01.mkv");
    touch(&source);

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.planned, 1);
    assert_eq!(report.encoded, 0);
    assert!(!fx.out.exists());
    assert!(source.exists());
    assert!(invocations(&fx.log).is_empty());
}

#[tokio::test]
async fn duplicate_stems_are_encoded_once() {
    let fx = fixture("25");
    touch(&fx.root.join("first").join("Show.S01E01.mkv"));
    touch(&fx.root.join("second").join("Show.S01E01.mp4"));

    let mut config = fx.config.clone();
    config.dry_run = true;
    let report = run_batch(&config, &software()).await.unwrap();
    assert_eq!(report.planned, 1);
    assert_eq!(report.skipped, 1);

    let report = run_batch(&fx.config, &software()).await.unwrap();
    assert_eq!(report.encoded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(invocations(&fx.log).len(), 1);
}

#[tokio::test]
async fn missing_root_is_reported() {
    let fx = fixture("25");
    let config = BatchConfig::new(fx.root.join("missing"));
    let err = run_batch(&config, &software()).await.unwrap_err();
    assert!(matches!(err, BatchError::InputNotFound(_)));
    assert_eq!(err.code(), "input_not_found");
}
