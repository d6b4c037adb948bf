use std::path::PathBuf;
use thiserror::Error;

use crate::ir::{CategoryId, ImageId};
use crate::validation::ValidationReport;

/// The main error type for trackprep operations.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input root does not exist or is not a directory: {path}")]
    InputRootMissing { path: PathBuf },

    #[error("Annotation file not found: {path}")]
    AnnotationFileMissing { path: PathBuf },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Annotation document {path} declares no categories")]
    EmptyCategorySet { path: PathBuf },

    #[error("Image {image_id} ('{file_name}') has invalid dimensions {width}x{height}")]
    InvalidImageDimensions {
        image_id: ImageId,
        file_name: String,
        width: u32,
        height: u32,
    },

    #[error("Annotation {annotation} references missing image {image_id}")]
    DanglingImageReference { annotation: String, image_id: ImageId },

    #[error("Annotation {annotation} references undeclared category {category_id}")]
    UnknownCategory {
        annotation: String,
        category_id: CategoryId,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("File operation failed on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to traverse {path}: {source}")]
    Traverse {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to parse YOLO label {path}:{line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportWrite(#[source] serde_json::Error),

    #[error("Conversion failed for {} split(s): {}", failed.len(), failed.join(", "))]
    ConversionFailed { failed: Vec<String> },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

/// Coarse classification used to decide how far a failure propagates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing inputs or unusable configuration; aborts before any work.
    Structural,
    /// Malformed annotation data; aborts the current document only.
    DataIntegrity,
    /// A single file could not be read, decoded or written; the batch continues.
    FileIo,
}

impl PrepError {
    /// Returns the taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            PrepError::InputRootMissing { .. }
            | PrepError::AnnotationFileMissing { .. }
            | PrepError::ConfigRead { .. }
            | PrepError::ConfigParse { .. }
            | PrepError::InvalidConfig(_)
            | PrepError::ThreadPool(_)
            | PrepError::ConversionFailed { .. }
            | PrepError::ValidationFailed { .. } => ErrorClass::Structural,

            PrepError::CocoJsonParse { .. }
            | PrepError::EmptyCategorySet { .. }
            | PrepError::InvalidImageDimensions { .. }
            | PrepError::DanglingImageReference { .. }
            | PrepError::UnknownCategory { .. }
            | PrepError::LabelParse { .. }
            | PrepError::ManifestParse { .. } => ErrorClass::DataIntegrity,

            PrepError::Io(_)
            | PrepError::ImageDecode { .. }
            | PrepError::ImageEncode { .. }
            | PrepError::FileIo { .. }
            | PrepError::Traverse { .. }
            | PrepError::ManifestWrite { .. }
            | PrepError::ReportWrite(_) => ErrorClass::FileIo,
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub(crate) fn file_io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> PrepError {
        let path = path.into();
        move |source| PrepError::FileIo { path, source }
    }
}
