//! PASCAL VOC to YOLO dataset tooling
//!
//! This library converts PASCAL VOC XML annotations to YOLO label files,
//! splits image/annotation pairs into train and validation sets, and
//! extracts the class vocabulary of a dataset.

pub mod classes;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod types;
pub mod utils;
pub mod voc;

// Re-export commonly used types and functions
pub use classes::{extract_classes, ClassSummary};
pub use config::{Args, Command};
pub use conversion::{convert, convert_annotation_file, convert_directory};
pub use dataset::{split_dataset, SplitConfig, SplitStats};
pub use error::{BoxError, ConfigError, RecordError};
pub use types::{
    AnnotationRecord, BoundingBox, ClassVocabulary, Conversion, NormalizedBox, ObjectInstance,
    ProcessingStats, RecordOutcome,
};
pub use voc::{parse_annotation_file, parse_annotation_str};
