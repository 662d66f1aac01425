//! engrave parser library
//!
//! Markdown rendering for biography bodies. Output is sanitized and can be
//! embedded into pages without further escaping.

pub mod markdown;

pub use markdown::{MarkdownError, MarkdownRenderer, Result};
