use std::collections::HashSet;
use std::path::{Path, PathBuf};

use archivist_core::{BatchError, EncoderBackend, FileState, Stem};
use archivist_scanner::{Classification, MediaEntry, classify, walk_media_dir};
use archivist_transcoder::capability::Capabilities;
use archivist_transcoder::command::{self, EncodeRequest};
use archivist_transcoder::{ffprobe, policy};
use tracing::{debug, error, info, warn};

use crate::config::{BatchConfig, FailurePolicy, UnclassifiedPolicy};
use crate::report::{BatchReport, FileOutcome};

/// Per-run values shared by every file.
struct RunContext<'a> {
    config: &'a BatchConfig,
    output_dir: PathBuf,
    backend: EncoderBackend,
}

/// Encode every video under the configured root that has no output yet.
///
/// Files are handled one at a time, in path order. Engine failures either
/// end the run or are recorded in the report, per `config.on_failure`.
/// Every other error ends the run.
pub async fn run_batch(
    config: &BatchConfig,
    caps: &Capabilities,
) -> Result<BatchReport, BatchError> {
    let root = &config.input_root;
    if !root.is_dir() {
        return Err(BatchError::InputNotFound(root.clone()));
    }

    let output_dir = config.output_dir();
    if !config.dry_run {
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| BatchError::OutputDir {
                path: output_dir.clone(),
                source: e,
            })?;
    }

    // Compare canonical forms so the walk recognizes the output dir however it was spelled.
    let root = root
        .canonicalize()
        .map_err(|_| BatchError::InputNotFound(root.clone()))?;
    let exclude = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.clone());

    let entries = walk_media_dir(&root, &exclude);
    let ctx = RunContext {
        config,
        output_dir,
        backend: caps.best(),
    };
    info!(
        root = %root.display(),
        output_dir = %ctx.output_dir.display(),
        files_found = entries.len(),
        backend = %ctx.backend,
        dry_run = config.dry_run,
        "batch started"
    );

    let mut report = BatchReport::new(ctx.backend, config.dry_run);
    let mut claimed: HashSet<Stem> = HashSet::new();

    for entry in &entries {
        report.discovered += 1;
        let outcome = process_file(&ctx, entry, &mut claimed).await?;
        report.record(outcome);
    }

    report.finish();
    info!(
        discovered = report.discovered,
        encoded = report.encoded,
        planned = report.planned,
        skipped = report.skipped,
        failed = report.failed,
        deleted = report.deleted,
        "batch finished"
    );
    Ok(report)
}

async fn process_file(
    ctx: &RunContext<'_>,
    entry: &MediaEntry,
    claimed: &mut HashSet<Stem>,
) -> Result<FileOutcome, BatchError> {
    let source = entry.path.as_path();
    let name = entry.file_name();
    debug!(file = %source.display(), state = %FileState::Discovered, "candidate file");

    let classification = classify(&name);
    let fallback = classification.is_fallback();
    let outcome = |stem: Option<Stem>, state: FileState| FileOutcome {
        source: source.to_path_buf(),
        size_bytes: entry.size_bytes,
        stem,
        fallback,
        state,
        policy: None,
        error: None,
    };

    if fallback && ctx.config.unclassified == UnclassifiedPolicy::Skip {
        warn!(file = %name, "no episode pattern in filename, skipping");
        return Ok(outcome(None, FileState::Skipped));
    }
    let stem = classification.stem().clone();

    let output = ctx.output_dir.join(stem.output_file_name());
    if output.exists() {
        debug!(file = %source.display(), %stem, state = %FileState::Skipped, "output exists");
        return Ok(outcome(Some(stem), FileState::Skipped));
    }

    if !claimed.insert(stem.clone()) {
        warn!(file = %source.display(), %stem, "stem already used earlier in this run, skipping");
        return Ok(outcome(Some(stem), FileState::Skipped));
    }

    match &classification {
        Classification::Classified { strategy, .. } => {
            debug!(file = %name, %stem, strategy, state = %FileState::Classified, "classified");
        }
        Classification::Unclassified { .. } => {
            warn!(file = %name, %stem, "no episode pattern in filename, using fallback stem");
        }
    }

    let src_fps = ffprobe::probe_frame_rate(&ctx.config.transcoder.ffprobe_path, source).await;
    debug!(%stem, src_fps, state = %FileState::Probed, "probed");

    let policy = policy::select(src_fps);
    debug!(%stem, reason = %policy.reason, state = %FileState::PolicySelected, "policy selected");

    let partial = ctx.output_dir.join(stem.partial_file_name());
    let args = command::build_args(&EncodeRequest {
        input: source,
        output: &partial,
        policy: &policy,
        backend: ctx.backend,
    });

    let mut done = outcome(Some(stem.clone()), FileState::PolicySelected);
    done.policy = Some(policy.reason.clone());

    if ctx.config.dry_run {
        info!(
            file = %source.display(),
            output = %output.display(),
            mode = %policy.reason,
            command = %command::render(&ctx.config.transcoder.ffmpeg_path, &args),
            "dry run, not encoding"
        );
        return Ok(done);
    }

    info!(
        file = %source.display(),
        %stem,
        src_fps = format_args!("{src_fps:.3}"),
        mode = %policy.reason,
        backend = %ctx.backend,
        state = %FileState::Encoding,
        "encoding"
    );

    if let Err(e) = command::run_ffmpeg(&ctx.config.transcoder.ffmpeg_path, &args).await {
        discard_partial(&partial).await;
        error!(file = %source.display(), %stem, error = %e, state = %FileState::Failed, "encode failed");
        if ctx.config.on_failure == FailurePolicy::Abort {
            return Err(BatchError::EncodeFailed {
                file: source.to_path_buf(),
                stem: stem.to_string(),
                reason: e.to_string(),
            });
        }
        done.state = FileState::Failed;
        done.error = Some(e.to_string());
        return Ok(done);
    }

    tokio::fs::rename(&partial, &output)
        .await
        .map_err(|e| BatchError::Finalize {
            path: output.clone(),
            source: e,
        })?;
    info!(output = %output.display(), state = %FileState::Done, "encoded");
    done.state = FileState::Done;

    if ctx.config.delete_source {
        tokio::fs::remove_file(source)
            .await
            .map_err(|e| BatchError::DeleteSource {
                path: source.to_path_buf(),
                source: e,
            })?;
        info!(file = %source.display(), state = %FileState::SourceDeleted, "source deleted");
        done.state = FileState::SourceDeleted;
    }

    Ok(done)
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "could not remove partial output");
        }
    }
}
