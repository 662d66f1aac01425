//! Error types for the engrave core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for engrave.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Front-matter block present but not a parsable mapping.
    #[error("Malformed front-matter in {path}: {message}")]
    MalformedFrontMatter { path: PathBuf, message: String },

    /// Structured metadata file could not be parsed.
    #[error("Invalid metadata in {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// A directory name that cannot be used as a person id.
    #[error("Invalid person id {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic configuration crate error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new malformed front-matter error.
    pub fn malformed_front_matter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedFrontMatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("missing field");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_malformed_front_matter_error() {
        let err = CoreError::malformed_front_matter("people/a/page.md", "expected a mapping");
        assert!(err.to_string().contains("Malformed front-matter"));
        assert!(err.to_string().contains("people/a/page.md"));
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_metadata_error() {
        let err = CoreError::metadata("people/a/info.yml", "bad indentation");
        assert!(err.to_string().contains("Invalid metadata"));
        assert!(err.to_string().contains("info.yml"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
