use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Build the worker pool used for per-record processing. `0` lets rayon
/// pick one thread per core.
pub fn create_io_thread_pool(workers: usize) -> Result<ThreadPool, ConfigError> {
    Ok(ThreadPoolBuilder::new().num_threads(workers).build()?)
}

/// Create a directory (and its parents) if it does not exist yet. Existing
/// content is left in place.
pub fn ensure_directory(path: &Path) -> Result<PathBuf, ConfigError> {
    fs::create_dir_all(path).map_err(|e| ConfigError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// List the regular files directly inside `dir` whose extension matches
/// one of `extensions`, sorted by path.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    files.sort();
    Ok(files)
}
