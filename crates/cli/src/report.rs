use std::path::PathBuf;

use archivist_core::{EncoderBackend, FileState, Stem};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How one candidate file ended up.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub size_bytes: u64,
    pub stem: Option<Stem>,
    /// Whether `stem` came from the fallback rather than a classifier strategy.
    pub fallback: bool,
    pub state: FileState,
    /// Frame-rate decision, e.g. `29.970->25`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub backend: EncoderBackend,
    pub dry_run: bool,
    pub discovered: usize,
    pub encoded: usize,
    /// Dry run only: files that would have been encoded.
    pub planned: usize,
    pub skipped: usize,
    pub fallback_stems: usize,
    pub failed: usize,
    pub deleted: usize,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(backend: EncoderBackend, dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            backend,
            dry_run,
            discovered: 0,
            encoded: 0,
            planned: 0,
            skipped: 0,
            fallback_stems: 0,
            failed: 0,
            deleted: 0,
            files: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome.state {
            FileState::Skipped => self.skipped += 1,
            FileState::Done => self.encoded += 1,
            FileState::SourceDeleted => {
                self.encoded += 1;
                self.deleted += 1;
            }
            FileState::Failed => self.failed += 1,
            _ if self.dry_run => self.planned += 1,
            _ => {}
        }
        if outcome.fallback && outcome.state != FileState::Skipped {
            self.fallback_stems += 1;
        }
        self.files.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
