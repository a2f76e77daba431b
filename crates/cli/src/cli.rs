use std::path::PathBuf;

use archivist_transcoder::TranscoderConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "archivist")]
#[command(author, version, about = "Batch-transcode episodes into a compact 640x480 archive")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log events as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub tools: ToolArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Locations of the external tools.
#[derive(Args)]
pub struct ToolArgs {
    /// ffmpeg binary
    #[arg(long, global = true, env = "ARCHIVIST_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe binary
    #[arg(long, global = true, env = "ARCHIVIST_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// NVIDIA management utility used to confirm a working GPU
    #[arg(long, global = true, env = "ARCHIVIST_NVIDIA_SMI", default_value = "nvidia-smi")]
    pub nvidia_smi: PathBuf,
}

impl ToolArgs {
    pub fn to_config(&self) -> TranscoderConfig {
        TranscoderConfig {
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            nvidia_smi_path: self.nvidia_smi.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode every video under a directory that has no output yet
    Encode {
        /// Directory to scan
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output directory (default: <ROOT>/encoded)
        #[arg(short, long, env = "ARCHIVIST_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Delete each source file after it is encoded successfully
        #[arg(long)]
        delete_source: bool,

        /// Show what would be done without encoding anything
        #[arg(long)]
        dry_run: bool,

        /// Continue with the next file when an encode fails
        #[arg(long)]
        keep_going: bool,

        /// Skip files whose names match no episode pattern instead of using a fallback name
        #[arg(long)]
        skip_unclassified: bool,

        /// Never use hardware encoders
        #[arg(long)]
        force_software: bool,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and show the encoding decision for it
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the output name each filename would get
    Classify {
        /// Filenames to classify
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Report which encoder backend this host would use
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
