use indicatif::ProgressBar;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::copy;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::io::{setup_output_directories, write_dataset_yaml};
use crate::types::{ClassVocabulary, ANNOTATION_EXTENSION, IMG_FORMATS};
use crate::utils::{create_progress_bar, list_files_with_extensions};

/// Inputs of a train/val split.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub output_dir: PathBuf,
    pub train_ratio: f64,
    /// Fixed seed for a reproducible shuffle; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub planned: usize,
    pub copied: usize,
    pub unmatched: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub train: PartitionStats,
    pub val: PartitionStats,
}

/// Shuffle `files` and cut them into (train, val) at `floor(len * train_ratio)`.
pub fn split_files(
    mut files: Vec<PathBuf>,
    train_ratio: f64,
    seed: Option<u64>,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    files.shuffle(&mut rng);

    let split_index = ((files.len() as f64 * train_ratio).floor() as usize).min(files.len());
    let val_files = files.split_off(split_index);
    (files, val_files)
}

/// Split the images of `config.images_dir` into train/val and copy each
/// image together with its annotation into the YOLO directory layout.
pub fn split_dataset(
    config: &SplitConfig,
    vocabulary: Option<&ClassVocabulary>,
) -> Result<SplitStats, ConfigError> {
    if !config.annotations_dir.is_dir() {
        return Err(ConfigError::MissingDirectory(config.annotations_dir.clone()));
    }
    let images = list_files_with_extensions(&config.images_dir, IMG_FORMATS)?;

    info!("Starting dataset split...");
    let output_dirs = setup_output_directories(&config.output_dir)?;
    info!("Created directory structure in '{}'.", config.output_dir.display());

    let (train_files, val_files) = split_files(images, config.train_ratio, config.seed);
    info!("Total images: {}", train_files.len() + val_files.len());
    info!("Training images: {}", train_files.len());
    info!("Validation images: {}", val_files.len());

    let train_pb = create_progress_bar(train_files.len() as u64, "Train");
    let train = copy_pairs(
        &train_files,
        &config.annotations_dir,
        &output_dirs.train_images_dir,
        &output_dirs.train_labels_dir,
        &train_pb,
    );
    train_pb.finish_with_message("Train copy complete");
    info!("Copied {} training file pairs.", train.copied);

    let val_pb = create_progress_bar(val_files.len() as u64, "Val");
    let val = copy_pairs(
        &val_files,
        &config.annotations_dir,
        &output_dirs.val_images_dir,
        &output_dirs.val_labels_dir,
        &val_pb,
    );
    val_pb.finish_with_message("Val copy complete");
    info!("Copied {} validation file pairs.", val.copied);

    if let Some(vocabulary) = vocabulary {
        info!("Creating dataset.yaml file...");
        write_dataset_yaml(&config.output_dir, vocabulary)
            .map_err(|e| ConfigError::io(config.output_dir.join("dataset.yaml"), e))?;
    }

    info!("Dataset splitting and copying complete!");
    Ok(SplitStats { train, val })
}

enum PairOutcome {
    Copied,
    Unmatched,
    Failed,
}

/// Copy each image and its `<stem>.xml` annotation into the target
/// directories. Images without an annotation are reported and skipped.
fn copy_pairs(
    images: &[PathBuf],
    annotations_dir: &Path,
    images_dest: &Path,
    labels_dest: &Path,
    pb: &ProgressBar,
) -> PartitionStats {
    let outcomes: Vec<PairOutcome> = images
        .par_iter()
        .map(|image_path| {
            let outcome = copy_pair(image_path, annotations_dir, images_dest, labels_dest);
            pb.inc(1);
            outcome
        })
        .collect();

    let mut stats = PartitionStats {
        planned: images.len(),
        ..PartitionStats::default()
    };
    for outcome in outcomes {
        match outcome {
            PairOutcome::Copied => stats.copied += 1,
            PairOutcome::Unmatched => stats.unmatched += 1,
            PairOutcome::Failed => stats.failed += 1,
        }
    }
    stats
}

fn copy_pair(
    image_path: &Path,
    annotations_dir: &Path,
    images_dest: &Path,
    labels_dest: &Path,
) -> PairOutcome {
    let (Some(file_name), Some(stem)) = (image_path.file_name(), image_path.file_stem()) else {
        warn!("Could not determine file name of {}", image_path.display());
        return PairOutcome::Unmatched;
    };

    // stems may contain dots
    let mut label_name = stem.to_os_string();
    label_name.push(".");
    label_name.push(ANNOTATION_EXTENSION);

    let label_src = annotations_dir.join(&label_name);
    if !image_path.is_file() || !label_src.is_file() {
        warn!(
            "Could not find image or label for {}",
            stem.to_string_lossy()
        );
        return PairOutcome::Unmatched;
    }

    let result = copy(image_path, images_dest.join(file_name))
        .and_then(|_| copy(&label_src, labels_dest.join(&label_name)));
    match result {
        Ok(_) => PairOutcome::Copied,
        Err(e) => {
            error!(
                "Failed to copy pair for {}: {}",
                stem.to_string_lossy(),
                e
            );
            PairOutcome::Failed
        }
    }
}
