use crate::error::{DecompackError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the metadata directory kept inside every output area.
pub const METADATA_DIR: &str = ".decompack";

const REPORT_FILE: &str = "report.json";

/// Directory that receives the bundles and archives of one input, or of a
/// whole combined run.
#[derive(Debug, Clone)]
pub struct OutputArea {
    base_path: PathBuf,
    output_directory: PathBuf,
    force_overwrite: bool,
}

impl OutputArea {
    /// One area per input stem, in order. Stems that sanitize to a name
    /// already taken (compared case-insensitively) get a `_2`, `_3`, ...
    /// suffix so no two inputs share a directory.
    pub fn individual_areas<P: Into<PathBuf>>(base_path: P, input_stems: &[&str]) -> Vec<Self> {
        let base_path = base_path.into();
        let mut taken = HashSet::new();

        input_stems
            .iter()
            .map(|stem| {
                let sanitized = sanitize_name(stem);
                let mut name = sanitized.clone();
                let mut suffix = 1;
                while !taken.insert(name.to_lowercase()) {
                    suffix += 1;
                    name = format!("{}_{}", sanitized, suffix);
                }

                if suffix > 1 {
                    log::warn!(
                        "Output area name '{}' is already used; writing '{}' to _decompiled_{}",
                        sanitized,
                        stem,
                        name
                    );
                }
                Self::with_name(base_path.clone(), format!("_decompiled_{}", name))
            })
            .collect()
    }

    /// `_decompiled_combined_<input dir name>` under `base_path`.
    pub fn combined<P: Into<PathBuf>>(base_path: P, input_dir_name: &str) -> Self {
        Self::with_name(
            base_path.into(),
            format!("_decompiled_combined_{}", sanitize_name(input_dir_name)),
        )
    }

    fn with_name(base_path: PathBuf, name: String) -> Self {
        let output_directory = base_path.join(name);
        Self {
            base_path,
            output_directory,
            force_overwrite: false,
        }
    }

    pub fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Creates the area and its metadata directory. An existing area is an
    /// error unless force overwrite is set, in which case it is removed first.
    pub fn initialize(&self) -> Result<()> {
        self.validate_paths()?;

        if self.output_directory.exists() {
            if !self.force_overwrite {
                return Err(DecompackError::OutputDirectoryExists {
                    path: self.output_directory.display().to_string(),
                });
            }
            log::info!(
                "Removing existing output directory {}",
                self.output_directory.display()
            );
            fs::remove_dir_all(&self.output_directory)?;
        }

        fs::create_dir_all(self.metadata_dir())?;
        log::debug!("Initialized output area {}", self.output_directory.display());

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.output_directory
    }

    pub fn exists(&self) -> bool {
        self.output_directory.exists()
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.output_directory.join(METADATA_DIR)
    }

    fn validate_paths(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).map_err(|e| DecompackError::Permission {
                path: format!(
                    "Cannot create base directory {}: {}",
                    self.base_path.display(),
                    e
                ),
            })?;
        }

        let test_file = self.base_path.join(".decompack_write_test");
        match fs::File::create(&test_file) {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                return Err(DecompackError::Permission {
                    path: format!(
                        "No write permission for directory {}: {}",
                        self.base_path.display(),
                        e
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Writes `report` as pretty JSON into the metadata directory of the area
/// rooted at `area_dir`.
pub fn write_report<T: Serialize>(area_dir: &Path, report: &T) -> Result<PathBuf> {
    let report_path = area_dir.join(METADATA_DIR).join(REPORT_FILE);
    let json_content = serde_json::to_string_pretty(report).map_err(|e| DecompackError::Config {
        message: format!("Failed to serialize report to JSON: {}", e),
    })?;

    fs::write(&report_path, json_content)?;
    Ok(report_path)
}

/// Makes a name safe to use as a single path component.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| match ch {
            c if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' => c,
            _ => '_',
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == ' ');

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        "unnamed".to_string()
    } else if sanitized.chars().count() > 100 {
        sanitized.chars().take(100).collect()
    } else {
        sanitized.to_string()
    }
}
