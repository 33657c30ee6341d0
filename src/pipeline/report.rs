use crate::config::{ArchiveMode, Config};
use crate::pipeline::inputs::InputUnit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    Individual,
    Combined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputStatus {
    Pending,
    Done,
    ExtractFailed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputOutcome {
    pub input: String,
    pub status: InputStatus,
    pub files_found: usize,
    pub files_bundled: usize,
    pub bundles: usize,
    pub archives: Vec<PathBuf>,
    pub output_area: Option<PathBuf>,
    pub error: Option<String>,
}

impl InputOutcome {
    pub fn new(unit: &InputUnit) -> Self {
        Self {
            input: unit.file_name.clone(),
            status: InputStatus::Pending,
            files_found: 0,
            files_bundled: 0,
            bundles: 0,
            archives: Vec::new(),
            output_area: None,
            error: None,
        }
    }

    pub fn with_output_area(mut self, area: &Path) -> Self {
        self.output_area = Some(area.to_path_buf());
        self
    }

    pub fn mark_failed(&mut self, message: String) {
        self.status = InputStatus::ExtractFailed;
        self.error = Some(message);
    }

    pub fn is_done(&self) -> bool {
        self.status == InputStatus::Done
    }
}

/// Settings that shaped the run, recorded alongside the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub files_per_archive: usize,
    pub max_bundle_bytes: u64,
    pub mode: ArchiveMode,
    pub extension: String,
    pub extractor: String,
}

impl ConfigSnapshot {
    pub fn from_config(config: &Config, extractor: &str) -> Self {
        Self {
            files_per_archive: config.archive.files_per_archive,
            max_bundle_bytes: config.max_bundle_bytes(),
            mode: config.archive.mode,
            extension: config.input.extension.clone(),
            extractor: extractor.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedArea {
    pub path: PathBuf,
    pub exists: bool,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub topology: Topology,
    pub input_directory: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub output_areas: Vec<PlannedArea>,
    pub config_used: ConfigSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub topology: Topology,
    pub input_directory: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration: Duration,
    pub inputs: Vec<InputOutcome>,
    /// Archives of the shared output area in combined runs.
    pub combined_archives: Vec<PathBuf>,
    pub combined_bundles: usize,
    pub output_areas: Vec<PathBuf>,
    pub cancelled: bool,
    pub config_used: ConfigSnapshot,
}

impl RunReport {
    pub fn new(topology: Topology, input_directory: &Path, config_used: ConfigSnapshot) -> Self {
        Self {
            topology,
            input_directory: input_directory.to_path_buf(),
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            inputs: Vec::new(),
            combined_archives: Vec::new(),
            combined_bundles: 0,
            output_areas: Vec::new(),
            cancelled: false,
            config_used,
        }
    }

    pub fn finish(&mut self) {
        let finished_at = Utc::now();
        self.duration = (finished_at - self.started_at).to_std().unwrap_or_default();
        self.finished_at = Some(finished_at);
    }

    pub fn succeeded(&self) -> usize {
        self.count(InputStatus::Done)
    }

    pub fn failed(&self) -> usize {
        self.count(InputStatus::ExtractFailed)
    }

    pub fn skipped(&self) -> usize {
        self.count(InputStatus::Cancelled)
    }

    fn count(&self, status: InputStatus) -> usize {
        self.inputs.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn total_archives(&self) -> usize {
        self.combined_archives.len()
            + self.inputs.iter().map(|o| o.archives.len()).sum::<usize>()
    }

    pub fn total_files(&self) -> usize {
        self.inputs.iter().map(|o| o.files_found).sum()
    }
}
