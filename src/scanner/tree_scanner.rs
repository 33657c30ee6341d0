use crate::error::{format_bytes, DecompackError, Result};
use crate::scanner::classifier::{classify, ClassificationKey};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files grouped by classification key. Keys iterate in sorted order.
pub type GroupedFiles = BTreeMap<ClassificationKey, Vec<PathBuf>>;

/// All regular files found under one extraction root.
#[derive(Debug, Clone)]
pub struct ExtractedTree {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ExtractedTree {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn grouped(&self) -> GroupedFiles {
        group_by_key(&self.files)
    }

    pub fn get_statistics(&self) -> TreeStatistics {
        let mut files_by_key = BTreeMap::new();
        let mut total_size = 0;

        for file in &self.files {
            *files_by_key.entry(classify(file).key.to_string()).or_insert(0) += 1;
            // Sizes are informational only; vanished files count as empty.
            total_size += std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        }

        TreeStatistics {
            total_files: self.files.len(),
            total_size,
            files_by_key,
        }
    }
}

pub fn group_by_key(files: &[PathBuf]) -> GroupedFiles {
    let mut grouped = GroupedFiles::new();
    for file in files {
        grouped
            .entry(classify(file).key)
            .or_default()
            .push(file.clone());
    }
    grouped
}

/// Collects regular files under a root. Symlinks are not followed.
#[derive(Debug, Default)]
pub struct TreeScanner;

impl TreeScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ExtractedTree> {
        let root_path = root.as_ref();

        if !root_path.is_dir() {
            return Err(DecompackError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root_path) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry under {}: {}", root_path.display(), err);
                    continue;
                }
            };

            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        files.sort();

        Ok(ExtractedTree {
            root: root_path.to_path_buf(),
            files,
        })
    }
}

#[derive(Debug, Default)]
pub struct TreeStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_key: BTreeMap<String, usize>,
}

impl TreeStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Extracted tree:\n  Total files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if !self.files_by_key.is_empty() {
            summary.push_str("  Files by type:\n");
            let mut keys: Vec<_> = self.files_by_key.iter().collect();
            keys.sort_by(|a, b| b.1.cmp(a.1));

            for (key, count) in keys {
                summary.push_str(&format!("    {}: {} files\n", key, count));
            }
        }

        summary
    }
}
