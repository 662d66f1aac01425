//! Site configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    record::{Locale, PersonId},
};

/// Default configuration file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "engrave.toml";

/// Main configuration structure for engrave.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Locale variants.
    #[serde(default)]
    pub locales: LocaleConfig,

    /// Markdown rendering settings.
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    #[serde(default = "default_title")]
    pub title: String,

    /// `lang` attribute of the default-locale pages.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Footer line, rendered as-is after escaping.
    #[serde(default = "default_footer")]
    pub footer: String,

    /// Repository hosting memorial discussions, as `owner/name`.
    #[serde(default)]
    pub comment_repo: Option<String>,

    /// Issue label the comment widget filters on.
    #[serde(default = "default_comment_label")]
    pub comment_label: String,
}

/// Build configuration. Relative paths resolve against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project root.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory holding one sub-directory per person.
    #[serde(default = "default_people_dir")]
    pub people_dir: PathBuf,

    /// Shared static assets copied into the output root.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Output directory for the published site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the aggregate listing in the output root.
    #[serde(default = "default_listing_file")]
    pub listing_file: String,

    /// Site-root-relative avatar used when a person has none.
    #[serde(default = "default_placeholder_avatar")]
    pub placeholder_avatar: String,
}

/// Locale configuration.
///
/// The default locale is implicit and always present; `variants` lists the
/// additional language tags in publishing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Variant language tags, e.g. `zh_hant`.
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,
}

/// Markdown rendering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Hosts allowed as `<iframe src>`; empty disables iframes entirely.
    #[serde(default)]
    pub iframe_hosts: Vec<String>,
}

fn default_title() -> String {
    "星语铭".to_string()
}

fn default_lang() -> String {
    "zh-CN".to_string()
}

fn default_footer() -> String {
    "© 2025 星语铭 | engrave.ren".to_string()
}

fn default_comment_label() -> String {
    "纪念".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_people_dir() -> PathBuf {
    PathBuf::from("people")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_listing_file() -> String {
    "people-list.json".to_string()
}

fn default_placeholder_avatar() -> String {
    "css/default-avatar.svg".to_string()
}

fn default_variants() -> Vec<String> {
    vec!["zh_hant".to_string(), "en".to_string()]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            lang: default_lang(),
            footer: default_footer(),
            comment_repo: None,
            comment_label: default_comment_label(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            people_dir: default_people_dir(),
            static_dir: default_static_dir(),
            output_dir: default_output_dir(),
            listing_file: default_listing_file(),
            placeholder_avatar: default_placeholder_avatar(),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `ENGRAVE__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ENGRAVE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_with_env(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.trim().is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        let listing = Path::new(&self.build.listing_file);
        if self.build.listing_file.is_empty()
            || listing.file_name().map(|n| n.len()) != Some(self.build.listing_file.len())
        {
            return Err(CoreError::config(
                "build.listing_file must be a plain file name",
            ));
        }

        for (i, tag) in self.locales.variants.iter().enumerate() {
            if tag.is_empty() {
                return Err(CoreError::config("locale variants cannot be empty"));
            }
            if PersonId::new(tag).is_err() || tag.contains('.') {
                return Err(CoreError::config(format!(
                    "locale variant {tag:?} is not a plain tag"
                )));
            }
            if self.locales.variants[..i].contains(tag) {
                return Err(CoreError::config(format!(
                    "locale variant {tag:?} is listed twice"
                )));
            }
        }

        if let Some(repo) = &self.site.comment_repo {
            if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
                tracing::warn!(repo = %repo, "site.comment_repo should look like owner/name");
            }
        }

        Ok(())
    }

    /// All locales in publishing order, default first.
    #[must_use]
    pub fn locales(&self) -> Vec<Locale> {
        std::iter::once(Locale::default_locale())
            .chain(self.locales.variants.iter().map(|tag| Locale::variant(tag.clone())))
            .collect()
    }

    /// Resolve a configured path against the project root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.build.root.join(path)
        }
    }

    /// Absolute (or root-relative) people directory.
    #[must_use]
    pub fn people_dir(&self) -> PathBuf {
        self.resolve(&self.build.people_dir)
    }

    /// Absolute (or root-relative) static assets directory.
    #[must_use]
    pub fn static_dir(&self) -> PathBuf {
        self.resolve(&self.build.static_dir)
    }

    /// Absolute (or root-relative) output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.build.output_dir)
    }
}
