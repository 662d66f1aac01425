//! Person records and their parts.

use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::{
    error::{CoreError, Result},
    frontmatter::FrontMatter,
    scalar::{is_collection, yaml_to_text},
};

/// Name of the published sub-directory holding all person pages.
pub const PEOPLE_SEGMENT: &str = "people";

/// Name of a person's media sub-directory, both in the source and the output.
pub const PHOTOS_SEGMENT: &str = "photos";

/// Name of a person's structured metadata file.
pub const INFO_FILE: &str = "info.yml";

/// Sort key of records without a known death date.
pub const UNKNOWN_SORT_KEY: &str = "0";

/// Directory name of a person, validated as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Validate a directory name.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("empty")
        } else if id == "." || id == ".." {
            Some("relative path component")
        } else if id.starts_with('.') {
            Some("hidden name")
        } else if id.contains(['/', '\\']) {
            Some("contains a path separator")
        } else if id.chars().any(char::is_control) {
            Some("contains control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// The id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One language variant of the site. The default locale has an empty tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    tag: String,
}

impl Locale {
    /// The default locale.
    #[must_use]
    pub fn default_locale() -> Self {
        Self { tag: String::new() }
    }

    /// A variant locale with the given tag.
    #[must_use]
    pub fn variant(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// The locale tag, empty for the default locale.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.tag.is_empty()
    }

    /// File name suffix: empty, or `.tag`.
    #[must_use]
    pub fn suffix(&self) -> String {
        if self.is_default() {
            String::new()
        } else {
            format!(".{}", self.tag)
        }
    }

    /// Source document name, e.g. `page.md` or `page.en.md`.
    #[must_use]
    pub fn page_file(&self) -> String {
        format!("page{}.md", self.suffix())
    }

    /// Output fragment name, e.g. `info.json` or `info.en.json`.
    #[must_use]
    pub fn fragment_file(&self) -> String {
        format!("info{}.json", self.suffix())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("default")
        } else {
            f.write_str(&self.tag)
        }
    }
}

/// Domain fields from `info.yml`.
///
/// Each field has one declared fallback spelling used by older records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredInfo {
    pub location: Option<String>,

    pub born: Option<String>,

    pub died: Option<String>,

    /// Explicit age as written; takes precedence over the computed one
    /// when it is a positive integer.
    pub age: Option<String>,

    pub aliases: Option<String>,

    /// Remaining keys.
    pub extra: BTreeMap<String, Value>,
}

/// Raw shape of the `info` mapping. Field values stay untyped so that one
/// bad value costs only that field.
#[derive(Debug, Default, Deserialize)]
struct RawInfo {
    #[serde(default, alias = "地点")]
    location: Option<Value>,

    #[serde(default, alias = "出生", alias = "birthDate")]
    born: Option<Value>,

    #[serde(default, alias = "去世", alias = "passDate")]
    died: Option<Value>,

    #[serde(default, alias = "年龄")]
    age: Option<Value>,

    #[serde(default, alias = "别名")]
    aliases: Option<Value>,

    #[serde(default, flatten)]
    extra: BTreeMap<String, Value>,
}

impl StructuredInfo {
    /// Canonical keys in display order.
    pub const KEYS: [&'static str; 5] = ["location", "born", "died", "age", "aliases"];

    fn from_value(value: Option<Value>, issues: &mut Vec<RecordIssue>) -> Self {
        let raw = match value {
            None | Some(Value::Null) => return Self::default(),
            Some(value) => match serde_yaml::from_value::<RawInfo>(value) {
                Ok(raw) => raw,
                Err(e) => {
                    issues.push(RecordIssue::IgnoredField {
                        field: "info".to_string(),
                        reason: e.to_string(),
                    });
                    return Self::default();
                }
            },
        };

        Self {
            location: field_text("info.location", raw.location, issues),
            born: field_text("info.born", raw.born, issues),
            died: field_text("info.died", raw.died, issues),
            age: field_text("info.age", raw.age, issues),
            aliases: field_text("info.aliases", raw.aliases, issues),
            extra: raw.extra,
        }
    }

    /// Flatten into a string map: canonical keys first, then extra keys.
    ///
    /// `age` is `derived_age`, which already reflects a valid explicit age.
    /// An explicit age that is not a positive integer is never published.
    #[must_use]
    pub fn to_entries(&self, derived_age: Option<u32>) -> Vec<(String, String)> {
        let canonical = [
            self.location.clone(),
            self.born.clone(),
            self.died.clone(),
            derived_age.map(|a| a.to_string()),
            self.aliases.clone(),
        ];

        let mut entries: Vec<(String, String)> = Self::KEYS
            .iter()
            .zip(canonical)
            .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), v)))
            .collect();

        entries.extend(
            self.extra
                .iter()
                .filter_map(|(key, value)| yaml_to_text(value).map(|v| (key.clone(), v))),
        );
        entries
    }
}

/// Where a person's avatar comes from, as written in `info.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// A file inside the person's `photos/` directory.
    Photo(String),
    /// An absolute `http(s)` URL.
    Remote(String),
}

impl AvatarSource {
    const LEGACY_PLACEHOLDER: &'static str = "${path}";

    /// Normalize a raw `avatar`/`profileUrl` value.
    ///
    /// Returns `Err` with a reason when the value would escape the photo
    /// directory.
    pub fn parse(raw: &str) -> std::result::Result<Self, &'static str> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::Remote(raw.to_string()));
        }

        let relative = raw
            .strip_prefix(Self::LEGACY_PLACEHOLDER)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(raw);
        let relative = relative.strip_prefix("photos/").unwrap_or(relative);

        if relative.is_empty() {
            return Err("empty avatar path");
        }
        if relative.starts_with('/') || relative.contains('\\') || relative.contains("${") {
            return Err("avatar must be a file inside photos/");
        }
        if Path::new(relative)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err("avatar must be a file inside photos/");
        }

        Ok(Self::Photo(relative.to_string()))
    }
}

/// An external link listed on a person's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Website {
    /// A bare URL.
    Url(String),
    /// A named URL.
    Named { name: String, url: String },
}

impl Website {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Named { url, .. } => url,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Named { name, .. } => name,
        }
    }
}

/// Raw shape of `info.yml` before normalization.
#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default, rename = "id")]
    display_id: Option<Value>,

    #[serde(default, alias = "profileUrl")]
    avatar: Option<Value>,

    #[serde(default)]
    info: Option<Value>,

    #[serde(default)]
    websites: Option<Value>,
}

/// Scalar text of a named field. Collections are recorded and dropped.
fn field_text(field: &str, value: Option<Value>, issues: &mut Vec<RecordIssue>) -> Option<String> {
    let value = value?;
    if is_collection(&value) {
        issues.push(RecordIssue::IgnoredField {
            field: field.to_string(),
            reason: "expected a single value".to_string(),
        });
        return None;
    }
    yaml_to_text(&value)
}

/// Website entries; entries of an unknown shape are recorded and dropped.
fn websites_from_value(value: Option<Value>, issues: &mut Vec<RecordIssue>) -> Vec<Website> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(entries)) => entries,
        Some(single) => vec![single],
    };

    let mut websites = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_yaml::from_value::<Website>(entry) {
            Ok(site) => websites.push(site),
            Err(_) => issues.push(RecordIssue::IgnoredField {
                field: format!("websites[{index}]"),
                reason: "expected a URL or {name, url}".to_string(),
            }),
        }
    }
    websites
}

/// Normalized contents of `info.yml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonMeta {
    /// Fallback display name when a document has no `name`.
    pub display_id: Option<String>,

    /// Avatar source, if one is configured and valid.
    pub avatar: Option<AvatarSource>,

    pub info: StructuredInfo,

    pub websites: Vec<Website>,
}

impl PersonMeta {
    /// Parse `info.yml` text, resolving every fallback key once.
    ///
    /// Only YAML that does not parse into a mapping fails. A field that
    /// cannot be used is dropped and reported through the returned issues.
    pub fn from_yaml(text: &str, path: &Path) -> Result<(Self, Vec<RecordIssue>)> {
        let raw: Option<RawMeta> =
            serde_yaml::from_str(text).map_err(|e| CoreError::metadata(path, e.to_string()))?;
        let raw = raw.unwrap_or_default();

        let mut issues = Vec::new();
        let display_id = field_text("id", raw.display_id, &mut issues);
        let avatar = match field_text("avatar", raw.avatar, &mut issues) {
            Some(value) => match AvatarSource::parse(&value) {
                Ok(source) => Some(source),
                Err(reason) => {
                    issues.push(RecordIssue::RejectedAvatar { value, reason });
                    None
                }
            },
            None => None,
        };
        let info = StructuredInfo::from_value(raw.info, &mut issues);
        let websites = websites_from_value(raw.websites, &mut issues);

        Ok((
            Self {
                display_id,
                avatar,
                info,
                websites,
            },
            issues,
        ))
    }
}

/// One locale's biography document.
#[derive(Debug, Clone)]
pub struct LocalizedContent {
    pub locale: Locale,
    pub front_matter: FrontMatter,
    /// Markdown body.
    pub body: String,
}

/// Resolved avatar location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarPath {
    /// A published photo of this person.
    Photo { id: PersonId, file: String },
    /// An absolute URL.
    Remote(String),
    /// The shared placeholder, relative to the site root.
    Placeholder(String),
}

impl Default for AvatarPath {
    fn default() -> Self {
        Self::Placeholder(String::new())
    }
}

impl AvatarPath {
    /// Build the path for a person from their avatar source.
    #[must_use]
    pub fn for_person(id: &PersonId, source: Option<&AvatarSource>, placeholder: &str) -> Self {
        match source {
            Some(AvatarSource::Photo(file)) => Self::Photo {
                id: id.clone(),
                file: file.clone(),
            },
            Some(AvatarSource::Remote(url)) => Self::Remote(url.clone()),
            None => Self::Placeholder(placeholder.to_string()),
        }
    }

    /// Path as seen from the site root, e.g. `people/<id>/photos/a.jpg`.
    #[must_use]
    pub fn root_relative(&self) -> String {
        match self {
            Self::Photo { id, file } => format!("{PEOPLE_SEGMENT}/{id}/{PHOTOS_SEGMENT}/{file}"),
            Self::Remote(url) => url.clone(),
            Self::Placeholder(path) => path.clone(),
        }
    }

    /// Path as seen from `people/<id>/`, e.g. `photos/a.jpg`.
    ///
    /// A placeholder given as a URL or an absolute path is used as is.
    #[must_use]
    pub fn person_relative(&self) -> String {
        match self {
            Self::Photo { file, .. } => format!("{PHOTOS_SEGMENT}/{file}"),
            Self::Remote(url) => url.clone(),
            Self::Placeholder(path) if is_absolute_ref(path) => path.clone(),
            Self::Placeholder(path) => format!("../../{path}"),
        }
    }
}

fn is_absolute_ref(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://")
}

/// Computed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    /// Age at death; always positive when present.
    pub age: Option<u32>,

    /// Ordering key; compared as a plain string.
    pub sort_key: String,

    pub avatar: AvatarPath,
}

impl Default for Derived {
    fn default() -> Self {
        Self {
            age: None,
            sort_key: UNKNOWN_SORT_KEY.to_string(),
            avatar: AvatarPath::default(),
        }
    }
}

/// A soft failure recorded against one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIssue {
    /// Front-matter could not be parsed; metadata was treated as empty.
    MalformedFrontMatter { locale: Locale, message: String },
    /// A variant locale was left out.
    DroppedLocale { locale: Locale, message: String },
    /// A locale document exists but could not be read.
    UnreadableLocale { locale: Locale, message: String },
    /// A date field is not `YYYY-MM-DD`.
    MalformedDate { field: &'static str, value: String },
    /// An explicit age that is not a positive integer.
    InvalidAge { value: String },
    /// An avatar value pointing outside the photo directory.
    RejectedAvatar { value: String, reason: &'static str },
    /// A metadata field with an unusable shape, treated as absent.
    IgnoredField { field: String, reason: String },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedFrontMatter { locale, message } => {
                write!(f, "malformed front-matter in {locale} locale: {message}")
            }
            Self::DroppedLocale { locale, message } => {
                write!(f, "{locale} locale dropped: {message}")
            }
            Self::UnreadableLocale { locale, message } => {
                write!(f, "{locale} locale unreadable: {message}")
            }
            Self::MalformedDate { field, value } => {
                write!(f, "malformed {field} date {value:?}")
            }
            Self::InvalidAge { value } => write!(f, "explicit age {value:?} is not a positive integer"),
            Self::RejectedAvatar { value, reason } => {
                write!(f, "avatar {value:?} ignored: {reason}")
            }
            Self::IgnoredField { field, reason } => write!(f, "field {field} ignored: {reason}"),
        }
    }
}

/// Everything known about one person during a build.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub id: PersonId,
    pub meta: PersonMeta,
    /// Present locales only, default first.
    pub content: Vec<LocalizedContent>,
    pub derived: Derived,
    pub issues: Vec<RecordIssue>,
}

impl PersonRecord {
    /// A record with no content and nothing derived yet.
    #[must_use]
    pub fn new(id: PersonId, meta: PersonMeta) -> Self {
        Self {
            id,
            meta,
            content: Vec::new(),
            derived: Derived::default(),
            issues: Vec::new(),
        }
    }

    /// Default-locale document, if loaded.
    #[must_use]
    pub fn default_content(&self) -> Option<&LocalizedContent> {
        self.content.iter().find(|c| c.locale.is_default())
    }

    /// Whether the record is published at all.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.default_content().is_some()
    }

    /// Display name for a document: its `name`, else the `info.yml` id, else
    /// the directory name.
    #[must_use]
    pub fn display_name(&self, content: &LocalizedContent) -> String {
        content
            .front_matter
            .name
            .clone()
            .or_else(|| self.meta.display_id.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Structured info with the derived age applied.
    #[must_use]
    pub fn info_entries(&self) -> Vec<(String, String)> {
        self.meta.info.to_entries(self.derived.age)
    }
}
