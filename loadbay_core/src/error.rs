//! Error types for loadbay_core.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias using loadbay_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during ingestion and repository operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON parse or serialization error.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Archive or tarball file does not exist.
    #[error("Archive not found: {}", .path.display())]
    ArchiveNotFound { path: PathBuf },

    /// The external extraction tool reported a nonzero status.
    #[error("Extraction of {} failed: {}", .archive.display(), .status)]
    ExtractionFailed { archive: PathBuf, status: String },

    /// The archive structure carries no repositories index.
    #[error("Archive structure has no repositories index")]
    NoRepositories,

    /// The target image:tag is already registered.
    #[error("Tag already exists: {image}:{tag}")]
    TagExists { image: String, tag: String },

    /// Repository is invalid or not initialized.
    #[error("Invalid repository at {}: {}", .path.display(), .reason)]
    InvalidRepo { path: PathBuf, reason: String },

    /// Invalid image or tag name.
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// Invalid layer identifier.
    #[error("Invalid layer id: {reason}")]
    InvalidLayerId { reason: String },

    /// A layer file could not be placed into the repository.
    #[error("Cannot copy layer {} from {}: {}", .layer, .path.display(), .source)]
    LayerCopy {
        layer: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Create an ArchiveNotFound error.
    pub fn archive_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ArchiveNotFound { path: path.into() }
    }

    /// Create an ExtractionFailed error from the tool's exit status.
    pub fn extraction_failed(archive: impl Into<PathBuf>, status: &ExitStatus) -> Self {
        Error::ExtractionFailed {
            archive: archive.into(),
            status: status.to_string(),
        }
    }

    /// Create a TagExists error.
    pub fn tag_exists(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Error::TagExists {
            image: image.into(),
            tag: tag.into(),
        }
    }

    /// Create an InvalidRepo error.
    pub fn invalid_repo(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidRepo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidName error.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Error::InvalidName {
            reason: reason.into(),
        }
    }

    /// Create an InvalidLayerId error.
    pub fn invalid_layer_id(reason: impl Into<String>) -> Self {
        Error::InvalidLayerId {
            reason: reason.into(),
        }
    }

    /// Create a LayerCopy error.
    pub fn layer_copy(
        layer: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::LayerCopy {
            layer: layer.into(),
            path: path.into(),
            source,
        }
    }
}
