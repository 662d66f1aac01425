//! Build orchestration.
//!
//! One [`Builder::build`] call is one full, non-incremental pass: load and
//! derive every record, write the home page and each person's photos and
//! pages, then the listing of everyone who published, then copy the static
//! tree.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    time::Instant,
};

use engrave_core::{Config, PersonId, PersonRecord, derive_fields};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    aggregate::{AggregateListing, aggregate},
    assets::{AssetError, AssetPublisher},
    html::{EmitError, PageEmitter},
    loader::{LoaderError, RecordLoader, SkippedRecord},
    output::{ensure_dir, write_atomic},
};

/// Build errors. Anything reported here stops the build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The people directory is missing or unreadable.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("page error: {0}")]
    Emit(#[from] EmitError),

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Records loaded from disk.
    pub records: usize,

    /// Directories skipped by the loader.
    pub skipped: usize,

    /// Records with pages emitted; exactly the listing entries.
    pub published: usize,

    /// Records without a default-locale document.
    pub unpublished: usize,

    /// Records whose pages or photos failed to write. These are left out of
    /// the listing.
    pub failed: usize,

    /// Soft issues across all records.
    pub issues: usize,

    /// Files written for people: fragments and detail pages.
    pub pages: usize,

    /// Photo and static files copied.
    pub assets: usize,

    pub duration_ms: u64,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} unpublished, {} skipped, {} failed; {} page files, {} assets in {}ms",
            self.published,
            self.unpublished,
            self.skipped,
            self.failed,
            self.pages,
            self.assets,
            self.duration_ms
        )
    }
}

/// State of one build invocation.
#[derive(Debug)]
pub struct BuildContext {
    /// Derived records in load order.
    pub records: Vec<PersonRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub stats: BuildStats,
}

impl BuildContext {
    /// Records that are published.
    pub fn publishable(&self) -> impl Iterator<Item = &PersonRecord> {
        self.records.iter().filter(|r| r.is_publishable())
    }

    /// Total soft issues, including skipped directories.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.skipped.len() + self.records.iter().map(|r| r.issues.len()).sum::<usize>()
    }
}

/// Site builder driven by a [`Config`].
#[derive(Debug)]
pub struct Builder {
    config: Config,
    people_dir: PathBuf,
    static_dir: PathBuf,
    output_dir: PathBuf,
}

impl Builder {
    /// Create a builder with directories resolved from `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            people_dir: config.people_dir(),
            static_dir: config.static_dir(),
            output_dir: config.output_dir(),
            config,
        }
    }

    /// Write into `dir` instead of the configured output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load and derive every record without writing anything.
    pub fn load(&self) -> Result<BuildContext> {
        let loader = RecordLoader::new(&self.people_dir, self.config.locales());
        let outcome = loader.load()?;

        let placeholder = &self.config.build.placeholder_avatar;
        let records: Vec<PersonRecord> = outcome
            .records
            .into_iter()
            .map(|record| derive_fields(record, placeholder))
            .collect();

        for record in &records {
            for issue in &record.issues {
                warn!(id = %record.id, issue = %issue, "record issue");
            }
        }

        let mut stats = BuildStats {
            records: records.len(),
            skipped: outcome.skipped.len(),
            ..Default::default()
        };
        stats.issues = records.iter().map(|r| r.issues.len()).sum();

        Ok(BuildContext {
            records,
            skipped: outcome.skipped,
            stats,
        })
    }

    /// Execute the full build.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        info!(
            people = %self.people_dir.display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        let mut ctx = self.load()?;
        ensure_dir(&self.output_dir).map_err(|source| BuildError::Write {
            path: self.output_dir.clone(),
            source,
        })?;

        let emitter = PageEmitter::new(&self.config)?;
        let publisher = AssetPublisher::new();

        emitter.emit_home(&self.output_dir)?;

        let mut failed: HashSet<PersonId> = HashSet::new();
        for record in &ctx.records {
            if !record.is_publishable() {
                warn!(id = %record.id, "no default-locale document, not published");
                ctx.stats.unpublished += 1;
                continue;
            }

            match self.emit_record(&emitter, &publisher, record) {
                Ok((pages, photos)) => {
                    ctx.stats.published += 1;
                    ctx.stats.pages += pages;
                    ctx.stats.assets += photos;
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "failed to publish person");
                    ctx.stats.failed += 1;
                    failed.insert(record.id.clone());
                }
            }
        }

        let published: Vec<PersonRecord> = ctx
            .records
            .iter()
            .filter(|record| !failed.contains(&record.id))
            .cloned()
            .collect();
        self.write_listing(&aggregate(&published))?;

        ctx.stats.assets += publisher.publish_static(&self.static_dir, &self.output_dir)?;
        ctx.stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let stats = ctx.stats;
        info!(
            published = stats.published,
            unpublished = stats.unpublished,
            skipped = stats.skipped,
            failed = stats.failed,
            pages = stats.pages,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );
        Ok(stats)
    }

    fn emit_record(
        &self,
        emitter: &PageEmitter,
        publisher: &AssetPublisher,
        record: &PersonRecord,
    ) -> Result<(usize, usize)> {
        let photos = publisher.publish_photos(record, &self.people_dir, &self.output_dir)?;
        let pages = emitter.emit_person(record, &self.output_dir)?;
        debug!(id = %record.id, pages, photos, "published person");
        Ok((pages, photos))
    }

    fn write_listing(&self, listing: &AggregateListing) -> Result<()> {
        let path = self.output_dir.join(&self.config.build.listing_file);
        write_atomic(&path, listing.to_json()?).map_err(|source| BuildError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), entries = listing.len(), "wrote listing");
        Ok(())
    }
}
