use dashmap::DashSet;
use indicatif::ProgressBar;
use log::{error, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, RecordError};
use crate::types::{
    AnnotationRecord, BoundingBox, ClassVocabulary, Conversion, NormalizedBox, ProcessingStats,
    RecordOutcome, ANNOTATION_EXTENSION, LABEL_EXTENSION,
};
use crate::utils::{create_progress_bar, ensure_directory, list_files_with_extensions};
use crate::voc::parse_annotation_file;

/// Convert one record to YOLO boxes.
///
/// Objects keep their input order. Objects whose class is not in the
/// vocabulary produce no box and are listed in [`Conversion::dropped`],
/// whatever state their box is in. A broken box on a vocabulary class
/// rejects the whole record.
pub fn convert(
    record: &AnnotationRecord,
    vocabulary: &ClassVocabulary,
) -> Result<Conversion, RecordError> {
    let mut conversion = Conversion {
        boxes: Vec::with_capacity(record.objects.len()),
        dropped: Vec::new(),
    };

    for object in &record.objects {
        let Some(class_id) = vocabulary.index_of(&object.class_name) else {
            conversion.dropped.push(object.class_name.clone());
            continue;
        };
        let bbox = object
            .bbox
            .clone()
            .map_err(|e| RecordError::from_box_error(&object.class_name, e))?;
        conversion
            .boxes
            .push(normalize_bbox(class_id, &bbox, record.width, record.height));
    }

    Ok(conversion)
}

/// Corner box in pixels to a center box normalized by the image size.
pub fn normalize_bbox(
    class_id: usize,
    bbox: &BoundingBox,
    image_width: u32,
    image_height: u32,
) -> NormalizedBox {
    let image_width = image_width as f64;
    let image_height = image_height as f64;

    let x_center = (bbox.xmin + bbox.xmax) / 2.0;
    let y_center = (bbox.ymin + bbox.ymax) / 2.0;
    let width = bbox.xmax - bbox.xmin;
    let height = bbox.ymax - bbox.ymin;

    NormalizedBox {
        class_id,
        x_center: x_center / image_width,
        y_center: y_center / image_height,
        width: width / image_width,
        height: height / image_height,
    }
}

/// Where the label file for `source` goes: next to it, or in `output_dir`.
pub fn label_path_for(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let label_path = source.with_extension(LABEL_EXTENSION);
    match (output_dir, label_path.file_name()) {
        (Some(dir), Some(file_name)) => dir.join(file_name),
        _ => label_path,
    }
}

/// Parse, convert and write the label file for a single annotation file.
///
/// `written` holds every label path produced so far in the run; writing one
/// of them again is reported as an overwrite.
pub fn convert_annotation_file(
    source: &Path,
    vocabulary: &ClassVocabulary,
    output_dir: Option<&Path>,
    written: &DashSet<PathBuf>,
) -> RecordOutcome {
    let conversion = match parse_annotation_file(source).and_then(|r| convert(&r, vocabulary)) {
        Ok(conversion) => conversion,
        Err(error) => {
            return RecordOutcome::Skipped {
                source: source.to_path_buf(),
                error,
            }
        }
    };

    for class_name in &conversion.dropped {
        warn!(
            "Class '{}' in {} is not in the vocabulary. Skipping.",
            class_name,
            source.display()
        );
    }

    let destination = label_path_for(source, output_dir);
    let overwrote = !written.insert(destination.clone());
    if overwrote {
        warn!(
            "{} overwrites a label file already written in this run: {}",
            source.display(),
            destination.display()
        );
    }

    match fs::write(&destination, conversion.to_label_text()) {
        Ok(()) => RecordOutcome::Converted {
            source: source.to_path_buf(),
            destination,
            boxes: conversion.boxes.len(),
            dropped: conversion.dropped.len(),
            overwrote,
        },
        Err(error) => RecordOutcome::Failed {
            source: source.to_path_buf(),
            error,
        },
    }
}

/// Convert a batch of annotation files in parallel and tally the outcomes.
pub fn process_annotations_in_parallel(
    files: &[PathBuf],
    vocabulary: &ClassVocabulary,
    output_dir: Option<&Path>,
    written: &DashSet<PathBuf>,
    pb: &ProgressBar,
) -> ProcessingStats {
    let outcomes: Vec<RecordOutcome> = files
        .par_iter()
        .map(|source| {
            let outcome = convert_annotation_file(source, vocabulary, output_dir, written);
            pb.inc(1);
            outcome
        })
        .collect();

    let mut stats = ProcessingStats::new();
    for outcome in &outcomes {
        match outcome {
            RecordOutcome::Skipped { source, error } => {
                error!("Error processing file {}: {}", source.display(), error)
            }
            RecordOutcome::Failed { source, error } => {
                error!(
                    "Failed to write label file for {}: {}",
                    source.display(),
                    error
                )
            }
            RecordOutcome::Converted { .. } => {}
        }
        stats.record(outcome);
    }
    stats
}

/// Convert every `.xml` file directly inside `label_dir`.
///
/// Label files are written next to the annotations unless `output_dir`
/// is given. Pass the same `written` set to every call of a run so that
/// stem collisions across directories are detected.
pub fn convert_directory(
    label_dir: &Path,
    vocabulary: &ClassVocabulary,
    output_dir: Option<&Path>,
    written: &DashSet<PathBuf>,
    pool: &ThreadPool,
) -> Result<ProcessingStats, ConfigError> {
    let xml_files = list_files_with_extensions(label_dir, &[ANNOTATION_EXTENSION])?;
    info!(
        "Found {} XML files in '{}'. Starting conversion...",
        xml_files.len(),
        label_dir.display()
    );

    let output_dir = output_dir.map(ensure_directory).transpose()?;
    let target_dir = output_dir.as_deref().unwrap_or(label_dir);

    let pb = create_progress_bar(xml_files.len() as u64, &label_dir.display().to_string());
    let stats = pool.install(|| {
        process_annotations_in_parallel(
            &xml_files,
            vocabulary,
            output_dir.as_deref(),
            written,
            &pb,
        )
    });
    pb.finish_with_message("Conversion complete");

    info!("Conversion complete for '{}'.", label_dir.display());
    let label_files = list_files_with_extensions(target_dir, &[LABEL_EXTENSION])?;
    info!(
        "Found {} .txt label files in '{}'.",
        label_files.len(),
        target_dir.display()
    );

    Ok(stats)
}
