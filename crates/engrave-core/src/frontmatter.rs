//! Front-matter parsing for biography documents.
//!
//! A document carries its metadata between the first two lines consisting of
//! exactly `---`. Everything after the second delimiter line is Markdown body.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    scalar::opt_text,
};

/// Delimiter line for YAML front-matter.
pub const DELIMITER: &str = "---";

/// Front-matter metadata of a localized biography document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Display name in this locale.
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// One-line description shown in listings.
    #[serde(
        default,
        alias = "desc",
        deserialize_with = "opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// Any other keys, kept in a stable order.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Whether no metadata was supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.extra.is_empty()
    }

    /// Serialize back to a YAML mapping.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Split a document into its front-matter block and body.
///
/// Returns `None` when fewer than two delimiter lines exist. Text before the
/// first delimiter is not part of either half.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut delimiters = Vec::with_capacity(2);
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let bare = line.strip_suffix('\n').unwrap_or(line);
        let bare = bare.strip_suffix('\r').unwrap_or(bare);
        if bare == DELIMITER {
            delimiters.push((start, offset));
            if delimiters.len() == 2 {
                break;
            }
        }
    }

    match delimiters.as_slice() {
        [(_, open_end), (close_start, close_end)] => {
            Some((&text[*open_end..*close_start], &text[*close_end..]))
        }
        _ => None,
    }
}

/// Parse front-matter strictly.
///
/// Fails with [`CoreError::MalformedFrontMatter`] when the block is present but
/// is not a YAML mapping. An empty block yields empty metadata.
pub fn parse_front_matter(text: &str, path: &Path) -> Result<(FrontMatter, String)> {
    let Some((block, body)) = split_front_matter(text) else {
        return Ok((FrontMatter::default(), text.to_string()));
    };

    let value: serde_yaml::Value = serde_yaml::from_str(block)
        .map_err(|e| CoreError::malformed_front_matter(path, e.to_string()))?;

    let front_matter = match value {
        serde_yaml::Value::Null => FrontMatter::default(),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
            .map_err(|e| CoreError::malformed_front_matter(path, e.to_string()))?,
        _ => {
            return Err(CoreError::malformed_front_matter(
                path,
                "front-matter is not a mapping",
            ));
        }
    };

    Ok((front_matter, body.to_string()))
}

/// A document after lenient parsing.
#[derive(Debug)]
pub struct ParsedDocument {
    /// Parsed metadata, empty when absent or malformed.
    pub front_matter: FrontMatter,

    /// Markdown body.
    pub body: String,

    /// Set when the front-matter block could not be parsed.
    pub malformed: Option<CoreError>,
}

/// Parse a document, never failing.
///
/// Malformed front-matter degrades to empty metadata with the whole text as
/// body, so every document produces some output.
pub fn parse_document(text: &str, path: &Path) -> ParsedDocument {
    match parse_front_matter(text, path) {
        Ok((front_matter, body)) => ParsedDocument {
            front_matter,
            body,
            malformed: None,
        },
        Err(err) => ParsedDocument {
            front_matter: FrontMatter::default(),
            body: text.to_string(),
            malformed: Some(err),
        },
    }
}
