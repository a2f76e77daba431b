use std::path::{Path, PathBuf};
use tracing::debug;

use crate::classify;

/// Video file discovered during a directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl MediaEntry {
    /// Bare file name, as handed to the classifier.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Walk `root` recursively and collect video files in sorted path order.
///
/// `exclude` (normally the output directory) is not descended into, nor are
/// hidden or junk entries. Symlinked directories are not followed.
pub fn walk_media_dir(root: &Path, exclude: &Path) -> Vec<MediaEntry> {
    let mut entries = Vec::new();
    walk_recursive(root, exclude, &mut entries);
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn walk_recursive(dir: &Path, exclude: &Path, entries: &mut Vec<MediaEntry>) {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if classify::should_ignore(&name) {
            debug!(path = %path.display(), "skipping ignored entry");
            continue;
        }

        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if path == exclude {
                debug!(path = %path.display(), "skipping output directory");
                continue;
            }
            walk_recursive(&path, exclude, entries);
        } else if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "not following directory symlink");
        } else if classify::is_video_file(&name) {
            let metadata = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(_) => continue,
            };
            entries.push(MediaEntry {
                path,
                size_bytes: metadata.len(),
            });
        }
    }
}
