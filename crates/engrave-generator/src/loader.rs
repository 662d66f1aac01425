//! Record discovery and loading.
//!
//! Reads `people/<id>/info.yml` and the per-locale `page*.md` documents into
//! [`PersonRecord`]s. Nothing is written here.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use engrave_core::{
    CoreError, Locale, LocalizedContent, PersonId, PersonMeta, PersonRecord, RecordIssue,
    frontmatter::{parse_document, parse_front_matter},
    record::INFO_FILE,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Loader errors. Only a missing people root stops a build.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The people directory does not exist or cannot be listed.
    #[error("people directory {path} is unreadable: {source}")]
    MissingRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Why a directory did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `info.yml` in the directory.
    MissingInfo,
    /// `info.yml` exists but cannot be read or parsed.
    InvalidInfo(String),
    /// The directory name is not usable as an id.
    InvalidId(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInfo => write!(f, "missing {INFO_FILE}"),
            Self::InvalidInfo(message) => write!(f, "invalid {INFO_FILE}: {message}"),
            Self::InvalidId(message) => write!(f, "invalid directory name: {message}"),
        }
    }
}

/// A person directory left out of the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Directory name as found on disk.
    pub dir_name: String,
    pub reason: SkipReason,
}

/// Everything one loading pass produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Loaded records in directory-name order.
    pub records: Vec<PersonRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Loads person records from a people directory.
#[derive(Debug)]
pub struct RecordLoader {
    root: PathBuf,
    locales: Vec<Locale>,
}

impl RecordLoader {
    /// Create a loader over `root` for the given locales, default first.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, locales: Vec<Locale>) -> Self {
        Self {
            root: root.into(),
            locales,
        }
    }

    /// The people directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the candidate person directories, sorted.
    ///
    /// Files and hidden entries are ignored.
    pub fn discover(&self) -> Result<Vec<String>> {
        let missing_root = |source: io::Error| LoaderError::MissingRoot {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(missing_root)? {
            let entry = entry.map_err(missing_root)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            // follows symlinks, unlike DirEntry::file_type
            if entry.path().is_dir() {
                names.push(name);
            }
        }

        names.sort();
        debug!(root = %self.root.display(), count = names.len(), "discovered person directories");
        Ok(names)
    }

    /// Load every discoverable record.
    pub fn load(&self) -> Result<LoadOutcome> {
        info!(root = %self.root.display(), "loading records");

        let mut outcome = LoadOutcome::default();
        for dir_name in self.discover()? {
            match self.load_record(&dir_name) {
                Ok(record) => outcome.records.push(record),
                Err(reason) => {
                    warn!(id = %dir_name, reason = %reason, "skipping person directory");
                    outcome.skipped.push(SkippedRecord { dir_name, reason });
                }
            }
        }

        info!(
            records = outcome.records.len(),
            skipped = outcome.skipped.len(),
            "records loaded"
        );
        Ok(outcome)
    }

    /// Load one person directory.
    pub fn load_record(&self, dir_name: &str) -> std::result::Result<PersonRecord, SkipReason> {
        let id = PersonId::new(dir_name).map_err(|e| SkipReason::InvalidId(e.to_string()))?;
        let dir = self.root.join(dir_name);

        let info_path = dir.join(INFO_FILE);
        let text = match fs::read_to_string(&info_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SkipReason::MissingInfo),
            Err(e) => return Err(SkipReason::InvalidInfo(e.to_string())),
        };
        let (meta, meta_issues) = PersonMeta::from_yaml(&text, &info_path)
            .map_err(|e| SkipReason::InvalidInfo(e.to_string()))?;

        let mut record = PersonRecord::new(id, meta);
        record.issues.extend(meta_issues);

        for locale in &self.locales {
            if let Some(content) = self.load_locale(&dir, locale, &mut record.issues) {
                record.content.push(content);
            }
        }

        debug!(id = %record.id, locales = record.content.len(), "loaded record");
        Ok(record)
    }

    fn load_locale(
        &self,
        dir: &Path,
        locale: &Locale,
        issues: &mut Vec<RecordIssue>,
    ) -> Option<LocalizedContent> {
        let path = dir.join(locale.page_file());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                issues.push(RecordIssue::UnreadableLocale {
                    locale: locale.clone(),
                    message: e.to_string(),
                });
                return None;
            }
        };

        if locale.is_default() {
            let parsed = parse_document(&text, &path);
            if let Some(error) = parsed.malformed {
                issues.push(RecordIssue::MalformedFrontMatter {
                    locale: locale.clone(),
                    message: front_matter_message(error),
                });
            }
            return Some(LocalizedContent {
                locale: locale.clone(),
                front_matter: parsed.front_matter,
                body: parsed.body,
            });
        }

        match parse_front_matter(&text, &path) {
            Ok((front_matter, body)) => Some(LocalizedContent {
                locale: locale.clone(),
                front_matter,
                body,
            }),
            Err(error) => {
                issues.push(RecordIssue::DroppedLocale {
                    locale: locale.clone(),
                    message: front_matter_message(error),
                });
                None
            }
        }
    }
}

fn front_matter_message(error: CoreError) -> String {
    match error {
        CoreError::MalformedFrontMatter { message, .. } => message,
        other => other.to_string(),
    }
}
