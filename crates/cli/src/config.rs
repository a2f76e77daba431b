use std::path::PathBuf;

use archivist_transcoder::TranscoderConfig;

/// Output directory name used when none is configured; created under the input root.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "encoded";

/// What to do when ffmpeg fails on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run at the first failure.
    #[default]
    Abort,
    /// Record the failure and move on to the next file.
    Continue,
}

/// What to do with files no classification strategy recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnclassifiedPolicy {
    /// Encode under a stem derived from the whole filename.
    #[default]
    Fallback,
    Skip,
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_root: PathBuf,
    /// Where finished files go; `<input_root>/encoded` when unset.
    pub output_dir: Option<PathBuf>,
    /// Remove each source after its encode succeeds.
    pub delete_source: bool,
    /// Classify, probe and log commands without running or writing anything.
    pub dry_run: bool,
    pub on_failure: FailurePolicy,
    pub unclassified: UnclassifiedPolicy,
    pub transcoder: TranscoderConfig,
}

impl BatchConfig {
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_dir: None,
            delete_source: false,
            dry_run: false,
            on_failure: FailurePolicy::default(),
            unclassified: UnclassifiedPolicy::default(),
            transcoder: TranscoderConfig::default(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_root.join(DEFAULT_OUTPUT_DIR_NAME))
    }
}
