use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::ClassVocabulary;

/// Tools for turning PASCAL VOC datasets into YOLO training data.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Number of worker threads; 0 uses one per CPU core
    #[arg(long = "workers", default_value_t = 0, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert VOC XML annotations into YOLO label files
    Convert(ConvertArgs),
    /// Split images and annotations into train/val directories
    Split(SplitArgs),
    /// List the classes found in a directory of VOC annotations
    Classes(ClassesArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ConvertArgs {
    /// Directory of VOC XML files; repeat to convert several directories
    #[arg(short = 'd', long = "label_dir", required = true)]
    pub label_dirs: Vec<PathBuf>,

    /// Write label files here instead of next to the XML files
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Write the processing summary as JSON to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub vocabulary: VocabularyArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SplitArgs {
    /// Directory containing the source images
    #[arg(short = 'i', long = "images_dir")]
    pub images_dir: PathBuf,

    /// Directory containing the VOC XML annotations
    #[arg(short = 'a', long = "annotations_dir")]
    pub annotations_dir: PathBuf,

    /// Base directory of the images/ and labels/ output trees
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: PathBuf,

    /// Proportion of the dataset to use for training
    #[arg(long = "train_size", default_value_t = 0.8, value_parser = validate_size)]
    pub train_size: f64,

    /// Seed for random shuffling; omit for a different split on every run
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Write the split summary as JSON to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    // dataset.yaml is only written when a vocabulary is given
    #[command(flatten)]
    pub vocabulary: VocabularyArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClassesArgs {
    /// Directory containing the VOC XML annotations
    #[arg(short = 'd', long = "annotations_dir")]
    pub annotations_dir: PathBuf,

    /// Write the sorted class names to this file, one per line
    #[arg(long = "write_vocabulary")]
    pub write_vocabulary: Option<PathBuf>,

    /// Write the class counts as JSON to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct VocabularyArgs {
    /// File with one class name per line
    #[arg(long = "classes_file", conflicts_with = "label_list")]
    pub classes_file: Option<PathBuf>,

    /// Ordered list of class names
    #[arg(value_delimiter = ',')]
    pub label_list: Vec<String>,
}

impl VocabularyArgs {
    /// The configured vocabulary, or `None` when neither a file nor a
    /// list was given.
    pub fn load(&self) -> Result<Option<ClassVocabulary>, ConfigError> {
        if let Some(path) = &self.classes_file {
            return ClassVocabulary::from_file(path).map(Some);
        }
        if self.label_list.is_empty() {
            return Ok(None);
        }
        ClassVocabulary::new(self.label_list.iter().map(|name| name.trim())).map(Some)
    }
}

// Validate that the size is between 0.0 and 1.0
pub fn validate_size(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("SIZE must be between 0.0 and 1.0".to_string()),
    }
}
