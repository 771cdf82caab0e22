//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Patch not found by name or path
    #[error("patch not found: {0}")]
    PatchNotFound(String),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn create_dir_factory_produces_correct_variant() {
        let err = ConfigError::create_dir("/dir/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::CreateDir { ref path, .. } if path == std::path::Path::new("/dir/path"))
        );
    }

    #[test]
    fn write_file_display() {
        let err = ConfigError::write_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
    }

    #[test]
    fn patch_not_found_display() {
        let err = ConfigError::PatchNotFound("warm_pad".to_string());
        assert_eq!(err.to_string(), "patch not found: warm_pad");
        assert!(err.source().is_none());
    }

    #[test]
    fn validation_wraps_source() {
        let err = ConfigError::from(ValidationError::UnknownParameter("q".to_string()));
        assert_eq!(err.to_string(), "validation failed: unknown parameter 'q'");
    }

    #[test]
    fn io_variants_expose_source() {
        assert!(
            ConfigError::read_file("/x", mock_io_err())
                .source()
                .is_some()
        );
        assert!(
            ConfigError::write_file("/x", mock_io_err())
                .source()
                .is_some()
        );
    }
}
