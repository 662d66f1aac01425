//! engrave generator library
//!
//! The memorial site build pipeline.
//!
//! # Modules
//!
//! - [`loader`] - person record discovery and loading
//! - [`aggregate`] - the sorted listing for the search page
//! - [`template`] - HTML templates with escaped interpolation
//! - [`html`] - per-locale fragments, detail pages and the home page
//! - [`assets`] - photo and static file publishing
//! - [`build`] - build orchestration

pub mod aggregate;
pub mod assets;
pub mod build;
pub mod html;
pub mod loader;
pub mod output;
pub mod template;

pub use aggregate::{AggregateListing, InfoMap, ListingEntry, aggregate};
pub use assets::AssetPublisher;
pub use build::{BuildContext, BuildError, BuildStats, Builder};
pub use html::{PageEmitter, PersonFragment};
pub use loader::{LoadOutcome, LoaderError, RecordLoader, SkipReason, SkippedRecord};
pub use template::{Template, TemplateContext, TemplateRegistry};
