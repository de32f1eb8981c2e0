//! Class/instance extraction.
//!
//! Scans a directory of VOC annotations and counts object instances per
//! class name, to help build the class vocabulary before conversion.

use dashmap::DashMap;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

use crate::error::ConfigError;
use crate::types::ANNOTATION_EXTENSION;
use crate::utils::list_files_with_extensions;
use crate::voc::read_voc_file;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub counts: BTreeMap<String, usize>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl ClassSummary {
    /// Distinct class names in lexical order.
    pub fn names(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    /// Instance counts, most frequent first; ties are ordered by name.
    pub fn counts_descending(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<_> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }

    /// Class list formatted for a YOLO dataset YAML file.
    pub fn to_yaml_snippet(&self) -> String {
        let mut yaml = format!("nc: {}\nnames:\n", self.counts.len());
        for name in self.counts.keys() {
            yaml.push_str(&format!("  - '{}'\n", name.replace('\'', "''")));
        }
        yaml
    }

    pub fn print_counts(&self) {
        info!("--- Instance Counts per Class ---");
        for (name, count) in self.counts_descending() {
            info!("{:<20}: {}", name, count);
        }
    }
}

/// Count object instances per class over every `.xml` file in `dir`.
///
/// Only object names are read, so records that would fail conversion
/// (missing size, bad boxes) still contribute. Unreadable or malformed
/// files are skipped with a warning.
pub fn extract_classes(dir: &Path) -> Result<ClassSummary, ConfigError> {
    let xml_files = list_files_with_extensions(dir, &[ANNOTATION_EXTENSION])?;
    if xml_files.is_empty() {
        return Err(ConfigError::NoAnnotations(dir.to_path_buf()));
    }
    info!("Found {} XML files. Processing...", xml_files.len());

    let counts: DashMap<String, usize> = DashMap::new();
    let skipped = AtomicUsize::new(0);

    xml_files.par_iter().for_each(|path| match read_voc_file(path) {
        Ok(doc) => {
            for name in doc.objects.iter().filter_map(|object| object.name.as_deref()) {
                let name = name.trim();
                if !name.is_empty() {
                    *counts.entry(name.to_string()).or_insert(0) += 1;
                }
            }
        }
        Err(e) => {
            warn!("Skipping malformed XML file {}: {}", path.display(), e);
            skipped.fetch_add(1, Relaxed);
        }
    });

    let files_skipped = skipped.into_inner();
    Ok(ClassSummary {
        counts: counts.into_iter().collect(),
        files_scanned: xml_files.len() - files_skipped,
        files_skipped,
    })
}
