use std::path::PathBuf;
use thiserror::Error;

/// Reasons a single annotation record cannot be converted.
///
/// A `RecordError` never aborts a batch: the record is skipped and the
/// caller moves on to the next one.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read annotation: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("'size' block not found")]
    MissingSize,

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' has malformed value '{value}'")]
    MalformedNumber { field: &'static str, value: String },

    #[error("image dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("invalid box for '{class_name}': ({xmin}, {ymin}, {xmax}, {ymax})")]
    InvalidBox {
        class_name: String,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
}

/// Problems with the box of a single object.
///
/// They are kept on the object and only turn into a [`RecordError`] when
/// the object's class is part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoxError {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' has malformed value '{value}'")]
    MalformedNumber { field: &'static str, value: String },

    #[error("inverted box ({xmin}, {ymin}, {xmax}, {ymax})")]
    Inverted {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
}

impl RecordError {
    pub fn from_box_error(class_name: &str, error: BoxError) -> Self {
        match error {
            BoxError::MissingField { field } => RecordError::MissingField { field },
            BoxError::MalformedNumber { field, value } => {
                RecordError::MalformedNumber { field, value }
            }
            BoxError::Inverted {
                xmin,
                ymin,
                xmax,
                ymax,
            } => RecordError::InvalidBox {
                class_name: class_name.to_string(),
                xmin,
                ymin,
                xmax,
                ymax,
            },
        }
    }
}

/// Errors that stop processing of a whole directory or run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("no .xml files found in {}", .0.display())]
    NoAnnotations(PathBuf),

    #[error("none of the label directories could be converted")]
    NoDirectoriesConverted,

    #[error("class vocabulary is empty")]
    EmptyVocabulary,

    #[error("class '{0}' appears more than once in the vocabulary")]
    DuplicateClass(String),

    #[error("class name '{0}' cannot be stored in a vocabulary file")]
    UnwritableClassName(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
