//! Copying person photos and the shared static tree into the output.

use std::path::{Path, PathBuf};

use engrave_core::{PersonRecord, record::PHOTOS_SEGMENT};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::{html::person_output_dir, output::copy_atomic};

/// Asset publishing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A walked entry outside its own root.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Recursive copier for static files.
///
/// Existing destination files are replaced. Hidden entries are copied from the
/// static tree (`.nojekyll`, `.well-known/`) but not from person directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetPublisher;

impl AssetPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy everything under `source` into `dest`, returning the file count.
    ///
    /// A missing `source` copies nothing.
    pub fn publish_tree(&self, source: &Path, dest: &Path) -> Result<usize> {
        self.copy_tree(source, dest, false)
    }

    fn copy_tree(&self, source: &Path, dest: &Path, skip_hidden: bool) -> Result<usize> {
        if !source.is_dir() {
            debug!(source = %source.display(), "no asset directory, skipping");
            return Ok(0);
        }

        let mut copied = 0;
        let walker = WalkDir::new(source)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !skip_hidden || entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|source_err| AssetError::Walk {
                root: source.to_path_buf(),
                source: source_err,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
            let target = dest.join(relative);

            copy_atomic(entry.path(), &target).map_err(|e| AssetError::Copy {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            copied += 1;
        }

        debug!(
            source = %source.display(),
            dest = %dest.display(),
            files = copied,
            "published assets"
        );
        Ok(copied)
    }

    /// Copy a person's `photos/` directory next to their pages, leaving out
    /// hidden files such as `.DS_Store`.
    pub fn publish_photos(
        &self,
        record: &PersonRecord,
        people_dir: &Path,
        out_dir: &Path,
    ) -> Result<usize> {
        let source = people_dir.join(record.id.as_str()).join(PHOTOS_SEGMENT);
        let dest = person_output_dir(out_dir, record).join(PHOTOS_SEGMENT);
        self.copy_tree(&source, &dest, true)
    }

    /// Copy the shared static tree into the output root.
    pub fn publish_static(&self, static_dir: &Path, out_dir: &Path) -> Result<usize> {
        let count = self.publish_tree(static_dir, out_dir)?;
        info!(files = count, "copied static assets");
        Ok(count)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
