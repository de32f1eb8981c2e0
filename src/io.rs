use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ConfigError;
use crate::types::{ClassVocabulary, OutputDirs};
use crate::utils::ensure_directory;

/// Set up the `images/{train,val}` and `labels/{train,val}` layout under `base_dir`
pub fn setup_output_directories(base_dir: &Path) -> Result<OutputDirs, ConfigError> {
    let labels_dir = base_dir.join("labels");
    let images_dir = base_dir.join("images");

    Ok(OutputDirs {
        train_labels_dir: ensure_directory(&labels_dir.join("train"))?,
        val_labels_dir: ensure_directory(&labels_dir.join("val"))?,
        train_images_dir: ensure_directory(&images_dir.join("train"))?,
        val_images_dir: ensure_directory(&images_dir.join("val"))?,
    })
}

/// Create the dataset.yaml file for YOLO training
pub fn write_dataset_yaml(base_dir: &Path, vocabulary: &ClassVocabulary) -> std::io::Result<()> {
    let dataset_yaml_path = base_dir.join("dataset.yaml");
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    let absolute_path = fs::canonicalize(base_dir)?;

    let mut yaml_content = format!(
        "path: {}\ntrain: images/train\nval: images/val\n",
        absolute_path.to_string_lossy()
    );
    yaml_content.push_str("\nnames:\n");
    for (id, label) in vocabulary.names().iter().enumerate() {
        yaml_content.push_str(&format!("    {}: {}\n", id, label));
    }

    dataset_yaml.write_all(yaml_content.as_bytes())?;
    dataset_yaml.flush()
}

/// Write a run summary as pretty-printed JSON.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<(), ConfigError> {
    let file = File::create(path).map_err(|e| ConfigError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| ConfigError::io(path, e.into()))?;
    writer.flush().map_err(|e| ConfigError::io(path, e))
}

/// Write class names one per line, the format read by
/// [`ClassVocabulary::from_file`].
///
/// Names that the reader would trim, skip as a comment or split across
/// lines are refused before anything is written.
pub fn write_vocabulary_file(path: &Path, names: &[String]) -> Result<(), ConfigError> {
    if let Some(name) = names.iter().find(|name| !is_storable_class_name(name)) {
        return Err(ConfigError::UnwritableClassName(name.clone()));
    }

    let mut content = names.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|e| ConfigError::io(path, e))
}

fn is_storable_class_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.starts_with('#')
        && !name.contains(|c: char| c == '\n' || c == '\r')
}
