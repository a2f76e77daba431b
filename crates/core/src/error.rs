use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encode failed for {file} ({stem}): {reason}")]
    EncodeFailed {
        file: PathBuf,
        stem: String,
        reason: String,
    },

    #[error("cannot finalize {path}: {source}")]
    Finalize {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot delete source {path}: {source}")]
    DeleteSource {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} file(s) failed to encode")]
    Incomplete(usize),
}

impl BatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "input_not_found",
            Self::OutputDir { .. } => "output_dir",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::Finalize { .. } => "finalize",
            Self::DeleteSource { .. } => "delete_source",
            Self::Incomplete(_) => "incomplete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages() {
        let e = BatchError::EncodeFailed {
            file: PathBuf::from("/in/a.mkv"),
            stem: "s01e01".into(),
            reason: "exit status: 1".into(),
        };
        assert_eq!(e.code(), "encode_failed");
        assert_eq!(
            e.to_string(),
            "encode failed for /in/a.mkv (s01e01): exit status: 1"
        );
        assert_eq!(BatchError::Incomplete(2).code(), "incomplete");
    }
}
