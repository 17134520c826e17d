use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cocodet operations.
#[derive(Debug, Error)]
pub enum CocodetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed annotation file {path}: {source}")]
    MalformedAnnotationFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Image {path} is too large: {width}x{height}")]
    ImageTooLarge {
        path: PathBuf,
        width: usize,
        height: usize,
    },

    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No companion image {image_path} for label file {label_path}")]
    MissingCompanionImage {
        label_path: PathBuf,
        image_path: PathBuf,
    },

    #[error("Malformed label line in {path} at line {line}: expected 5 fields, found {fields}")]
    MalformedLabelLine {
        path: PathBuf,
        line: usize,
        fields: usize,
    },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid labels directory {path}: {message}")]
    LabelsDirInvalid { path: PathBuf, message: String },

    #[error("Failed to parse class names from {path}: {message}")]
    ClassNamesInvalid { path: PathBuf, message: String },

    #[error("Failed to serialize report: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model returned no loss terms")]
    EmptyLoss,

    #[error("Model error: {0}")]
    Model(String),

    #[error("No training backend compiled in (rebuild with `--features {feature}`)")]
    BackendUnavailable { feature: &'static str },

    #[cfg(feature = "tch")]
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),
}
