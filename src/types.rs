use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BoxError, ConfigError, RecordError};

// Image extensions picked up by the dataset splitter
pub const IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png"];

pub const ANNOTATION_EXTENSION: &str = "xml";
pub const LABEL_EXTENSION: &str = "txt";

/// Ordered, immutable list of class names.
///
/// The position of a name is the class id written to YOLO label files, so
/// the same vocabulary must be used for every conversion of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ClassVocabulary {
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            if index.insert(name.clone(), id).is_some() {
                return Err(ConfigError::DuplicateClass(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    /// Read a vocabulary file: one class per line, blank lines and `#`
    /// comments ignored.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn index_of(&self, class_name: &str) -> Option<usize> {
        self.index.get(class_name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// Raw PASCAL VOC document. Every leaf is optional so that missing pieces
// can be reported by name during validation. Deserialized by hand in
// `voc.rs` because `<object>` elements need not be adjacent.
#[derive(Debug, Clone, Default)]
pub struct VocAnnotation {
    pub filename: Option<String>,
    pub size: Option<VocSize>,
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocSize {
    pub width: Option<String>,
    pub height: Option<String>,
    pub depth: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocObject {
    pub name: Option<String>,
    pub bndbox: Option<VocBndBox>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocBndBox {
    pub xmin: Option<String>,
    pub ymin: Option<String>,
    pub xmax: Option<String>,
    pub ymax: Option<String>,
}

/// Corner-format box in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// One labeled object. The box is validated on parse, but a bad box only
/// fails the record when the class is converted.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    pub class_name: String,
    pub bbox: Result<BoundingBox, BoxError>,
}

/// Validated ground truth of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub width: u32,
    pub height: u32,
    pub objects: Vec<ObjectInstance>,
}

/// A YOLO label line: class id plus a center-format box normalized by the
/// image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// Reconstruct the absolute corner box for an image of the given size.
    pub fn to_corners(&self, image_width: u32, image_height: u32) -> BoundingBox {
        let w = image_width as f64;
        let h = image_height as f64;
        BoundingBox {
            xmin: (self.x_center - self.width / 2.0) * w,
            ymin: (self.y_center - self.height / 2.0) * h,
            xmax: (self.x_center + self.width / 2.0) * w,
            ymax: (self.y_center + self.height / 2.0) * h,
        }
    }
}

impl fmt::Display for NormalizedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Result of converting one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub boxes: Vec<NormalizedBox>,
    /// Class names that were not in the vocabulary, in input order.
    pub dropped: Vec<String>,
}

impl Conversion {
    /// Label file content: lines joined by `\n`, no trailing newline.
    pub fn to_label_text(&self) -> String {
        self.boxes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What happened to one annotation file during a batch.
#[derive(Debug)]
pub enum RecordOutcome {
    Converted {
        source: PathBuf,
        destination: PathBuf,
        boxes: usize,
        dropped: usize,
        /// The destination had already been written earlier in this run.
        overwrote: bool,
    },
    Skipped {
        source: PathBuf,
        error: RecordError,
    },
    Failed {
        source: PathBuf,
        error: std::io::Error,
    },
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub empty_label_files: usize,
    pub dropped_instances: usize,
    pub overwritten_label_files: usize,
    pub skipped_records: usize,
    pub failed_conversions: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.total_files_processed += 1;
        match outcome {
            RecordOutcome::Converted {
                boxes,
                dropped,
                overwrote,
                ..
            } => {
                self.successful_conversions += 1;
                self.dropped_instances += dropped;
                if *overwrote {
                    self.overwritten_label_files += 1;
                }
                if *boxes == 0 {
                    self.empty_label_files += 1;
                }
            }
            RecordOutcome::Skipped { .. } => self.skipped_records += 1,
            RecordOutcome::Failed { .. } => self.failed_conversions += 1,
        }
    }

    pub fn merge(&mut self, other: &ProcessingStats) {
        self.total_files_processed += other.total_files_processed;
        self.successful_conversions += other.successful_conversions;
        self.empty_label_files += other.empty_label_files;
        self.dropped_instances += other.dropped_instances;
        self.overwritten_label_files += other.overwritten_label_files;
        self.skipped_records += other.skipped_records;
        self.failed_conversions += other.failed_conversions;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total files processed: {}", self.total_files_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Empty label files: {}", self.empty_label_files);
        log::info!("Skipped records: {}", self.skipped_records);
        log::info!("Failed conversions: {}", self.failed_conversions);

        if self.dropped_instances > 0 {
            log::warn!(
                "Dropped {} object instances with classes outside the vocabulary",
                self.dropped_instances
            );
        }
        if self.overwritten_label_files > 0 {
            log::warn!(
                "{} label files were written more than once; annotation stems collide",
                self.overwritten_label_files
            );
        }
    }
}

/// Output directories of a train/val split.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub train_labels_dir: PathBuf,
    pub val_labels_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
}
