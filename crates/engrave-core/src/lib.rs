//! engrave core library
//!
//! Person records, configuration, front-matter parsing, field derivation and
//! error handling for the engrave memorial site builder.

pub mod config;
pub mod derive;
pub mod error;
pub mod frontmatter;
pub mod record;
mod scalar;

pub use config::Config;
pub use derive::derive_fields;
pub use error::{CoreError, Result};
pub use frontmatter::{FrontMatter, ParsedDocument, parse_document};
pub use record::{
    AvatarPath, AvatarSource, Derived, Locale, LocalizedContent, PersonId, PersonMeta,
    PersonRecord, RecordIssue, StructuredInfo, Website,
};
