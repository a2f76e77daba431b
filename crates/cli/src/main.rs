mod cli;

use anyhow::Context;
use archivist_cli::{BatchConfig, FailurePolicy, UnclassifiedPolicy, run_batch};
use archivist_core::BatchError;
use archivist_scanner::{Classification, classify};
use archivist_transcoder::capability::{self, Capabilities};
use archivist_transcoder::{TranscoderConfig, ffprobe, policy};
use clap::Parser;
use cli::{Cli, Commands};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let tools = cli.tools.to_config();

    match cli.command {
        Commands::Encode {
            root,
            output_dir,
            delete_source,
            dry_run,
            keep_going,
            skip_unclassified,
            force_software,
            json,
        } => {
            let config = BatchConfig {
                output_dir,
                delete_source,
                dry_run,
                on_failure: if keep_going {
                    FailurePolicy::Continue
                } else {
                    FailurePolicy::Abort
                },
                unclassified: if skip_unclassified {
                    UnclassifiedPolicy::Skip
                } else {
                    UnclassifiedPolicy::Fallback
                },
                transcoder: tools,
                ..BatchConfig::new(root)
            };

            let caps = if force_software {
                info!("hardware detection disabled, using software encoder");
                Capabilities::software_only()
            } else {
                capability::detect(&config.transcoder).await
            };

            let report = run_batch(&config, &caps).await.with_context(|| {
                format!("batch over {} stopped", config.input_root.display())
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if report.failed > 0 {
                return Err(BatchError::Incomplete(report.failed).into());
            }
        }

        Commands::Probe { file, json } => probe_file(&tools, &file, json).await?,

        Commands::Classify { names } => {
            for name in &names {
                match classify(name) {
                    Classification::Classified { stem, strategy } => {
                        println!("{name}\t{stem}\t{strategy}");
                    }
                    Classification::Unclassified { fallback } => {
                        println!("{name}\t{fallback}\tfallback");
                    }
                }
            }
        }

        Commands::CheckTools { json } => {
            let caps = capability::detect(&tools).await;
            if json {
                let out = json!({ "capabilities": caps, "backend": caps.best() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("nvenc:        {}", caps.nvenc);
                println!("videotoolbox: {}", caps.videotoolbox);
                println!("backend:      {} ({})", caps.best(), caps.best().encoder_name());
            }
        }
    }

    Ok(())
}

async fn probe_file(
    tools: &TranscoderConfig,
    file: &std::path::Path,
    json: bool,
) -> anyhow::Result<()> {
    let media = ffprobe::probe(&tools.ffprobe_path, file)
        .await
        .with_context(|| format!("failed to probe {}", file.display()))?;
    let src_fps = media.video.as_ref().map(|v| v.framerate).unwrap_or(0.0);
    let policy = policy::select(src_fps);
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let classification = classify(&name);

    if json {
        let out = json!({
            "media": media,
            "stem": classification.stem(),
            "fallback_stem": classification.is_fallback(),
            "policy": policy,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File:      {}", file.display());
    println!("Container: {}", media.container);
    println!("Duration:  {:.1}s", media.duration_secs);
    match &media.video {
        Some(v) => println!(
            "Video:     #{} {} {}x{} @ {:.3} fps",
            v.index, v.codec, v.width, v.height, v.framerate
        ),
        None => println!("Video:     none"),
    }
    for a in &media.audio {
        println!(
            "Audio:     #{} {} {}ch {}",
            a.index,
            a.codec,
            a.channels,
            a.language.as_deref().unwrap_or("und")
        );
    }
    println!(
        "Output:    {}{}",
        classification.stem().output_file_name(),
        if classification.is_fallback() { " (fallback name)" } else { "" }
    );
    println!(
        "Policy:    -r {} -g {} -keyint_min {} ({})",
        policy.mode.rate_arg(),
        policy.gop,
        policy.keyint_min,
        policy.reason
    );
    Ok(())
}
