use crate::archiver::pack;
use crate::bundler::{create_bundles, AggregatorState};
use crate::config::{ArchiveMode, Config};
use crate::error::{format_bytes, DecompackError, Result};
use crate::extractor::{sanitize_name, write_report, Extractor, OutputArea};
use crate::pipeline::inputs::{input_dir_name, InputUnit};
use crate::pipeline::report::{
    ConfigSnapshot, InputOutcome, InputStatus, PlannedArea, RunPlan, RunReport, Topology,
};
use crate::scanner::{ExtractedTree, TreeScanner};
use crate::ui::GracefulShutdown;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COMBINED_PREFIX: &str = "combined_context";

/// Drives every input through extraction, bundling and packing, one at a
/// time in the order given.
pub struct Orchestrator<'a> {
    config: &'a Config,
    extractor: &'a dyn Extractor,
    shutdown: Option<&'a GracefulShutdown>,
    on_input_done: Option<&'a dyn Fn(&InputOutcome)>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, extractor: &'a dyn Extractor) -> Self {
        Self {
            config,
            extractor,
            shutdown: None,
            on_input_done: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: &'a GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn with_progress(mut self, callback: &'a dyn Fn(&InputOutcome)) -> Self {
        self.on_input_done = Some(callback);
        self
    }

    /// The output areas a run over `inputs` would write to.
    pub fn planned_areas(&self, input_dir: &Path, inputs: &[InputUnit]) -> Vec<OutputArea> {
        let base = &self.config.output.base_directory;
        let force = self.config.output.force_overwrite;

        if self.config.archive.combine {
            vec![OutputArea::combined(base, &input_dir_name(input_dir)).with_force_overwrite(force)]
        } else {
            let stems: Vec<&str> = inputs.iter().map(|unit| unit.name.as_str()).collect();
            OutputArea::individual_areas(base, &stems)
                .into_iter()
                .map(|area| area.with_force_overwrite(force))
                .collect()
        }
    }

    /// Fails if any planned area already exists and overwriting is off.
    pub fn preflight(&self, input_dir: &Path, inputs: &[InputUnit]) -> Result<()> {
        if self.config.output.force_overwrite {
            return Ok(());
        }

        match self
            .planned_areas(input_dir, inputs)
            .into_iter()
            .find(|area| area.exists())
        {
            Some(area) => Err(DecompackError::OutputDirectoryExists {
                path: area.path().display().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn plan(&self, input_dir: &Path, inputs: &[InputUnit]) -> RunPlan {
        RunPlan {
            topology: self.topology(),
            input_directory: input_dir.to_path_buf(),
            inputs: inputs.iter().map(|unit| unit.path.clone()).collect(),
            output_areas: self
                .planned_areas(input_dir, inputs)
                .iter()
                .map(|area| PlannedArea {
                    path: area.path().to_path_buf(),
                    exists: area.exists(),
                })
                .collect(),
            config_used: ConfigSnapshot::from_config(self.config, self.extractor.name()),
        }
    }

    fn topology(&self) -> Topology {
        if self.config.archive.combine {
            Topology::Combined
        } else {
            Topology::Individual
        }
    }

    pub fn run(&self, input_dir: &Path, inputs: &[InputUnit]) -> Result<RunReport> {
        self.preflight(input_dir, inputs)?;

        let topology = self.topology();
        let snapshot = ConfigSnapshot::from_config(self.config, self.extractor.name());
        let mut report = RunReport::new(topology, input_dir, snapshot);

        match topology {
            Topology::Individual => self.run_individual(input_dir, inputs, &mut report)?,
            Topology::Combined => self.run_combined(input_dir, inputs, &mut report)?,
        }

        report.finish();
        self.save_reports(&report);

        Ok(report)
    }

    fn run_individual(
        &self,
        input_dir: &Path,
        inputs: &[InputUnit],
        report: &mut RunReport,
    ) -> Result<()> {
        let areas = self.planned_areas(input_dir, inputs);

        for (index, (unit, area)) in inputs.iter().zip(&areas).enumerate() {
            if self.is_cancelled() {
                self.mark_cancelled(&inputs[index..], report);
                break;
            }

            let outcome = self.process_individual(unit, area)?;
            if let Some(area) = &outcome.output_area {
                report.output_areas.push(area.clone());
            }
            self.notify(&outcome);
            report.inputs.push(outcome);
        }

        Ok(())
    }

    fn process_individual(&self, unit: &InputUnit, area: &OutputArea) -> Result<InputOutcome> {
        log::info!("Processing '{}'", unit.file_name);

        area.initialize()?;

        let mut outcome = InputOutcome::new(unit).with_output_area(area.path());
        let scratch = self.create_scratch()?;

        if let Err(e) = self.extractor.extract(&unit.path, scratch.path()) {
            log::error!("Extraction failed for '{}': {}", unit.file_name, e);
            outcome.mark_failed(e.to_string());
            discard_scratch(scratch, &unit.file_name);
            return Ok(outcome);
        }

        let packed = self.pack_tree(unit, scratch.path(), area.path(), &mut outcome);
        discard_scratch(scratch, &unit.file_name);
        packed?;

        outcome.status = InputStatus::Done;
        log::info!(
            "Finished '{}': {} files, {} archive(s)",
            unit.file_name,
            outcome.files_found,
            outcome.archives.len()
        );

        Ok(outcome)
    }

    fn pack_tree(
        &self,
        unit: &InputUnit,
        scratch: &Path,
        area: &Path,
        outcome: &mut InputOutcome,
    ) -> Result<()> {
        let tree = TreeScanner::new().scan(scratch)?;
        outcome.files_found = tree.len();
        log_tree_statistics(&tree);

        if tree.is_empty() {
            log::warn!("No files were extracted from '{}'", unit.file_name);
        }

        let chunk_size = self.config.archive.files_per_archive;
        let stem = sanitize_name(&unit.name);

        match self.config.archive.mode {
            ArchiveMode::Context => {
                let grouped = tree.grouped();
                let bundles = create_bundles(
                    &grouped,
                    area,
                    scratch,
                    self.config.max_bundle_bytes(),
                )?;
                outcome.bundles = bundles.len();
                outcome.files_bundled = bundle_file_count(&grouped);
                outcome.archives =
                    pack(&bundles, area, chunk_size, &format!("context_{}", stem), None)?;
            }
            ArchiveMode::Direct => {
                outcome.archives = pack(
                    &tree.files,
                    area,
                    chunk_size,
                    &format!("direct_{}", stem),
                    Some(scratch),
                )?;
            }
        }

        Ok(())
    }

    fn run_combined(
        &self,
        input_dir: &Path,
        inputs: &[InputUnit],
        report: &mut RunReport,
    ) -> Result<()> {
        let area = OutputArea::combined(&self.config.output.base_directory, &input_dir_name(input_dir))
            .with_force_overwrite(self.config.output.force_overwrite);
        area.initialize()?;
        report.output_areas.push(area.path().to_path_buf());

        if self.config.archive.mode == ArchiveMode::Direct {
            log::info!("Combined runs always build context bundles; direct mode is ignored");
        }

        let mut state = AggregatorState::new(area.path(), self.config.max_bundle_bytes());
        let fed = self.feed_combined(inputs, &mut state, report);
        let stats = state.stats();
        log::info!(
            "Combined bundles hold {} files ({}) from {} input(s)",
            stats.files_appended,
            format_bytes(stats.bytes_appended),
            state.inputs_appended()
        );
        let closed = state.close();
        fed?;
        let bundles = closed?;
        report.combined_bundles = bundles.len();

        if report.cancelled {
            log::warn!(
                "Run cancelled; {} bundle(s) left unpacked in {}",
                bundles.len(),
                area.path().display()
            );
            return Ok(());
        }

        report.combined_archives = pack(
            &bundles,
            area.path(),
            self.config.archive.files_per_archive,
            COMBINED_PREFIX,
            None,
        )?;

        Ok(())
    }

    fn feed_combined(
        &self,
        inputs: &[InputUnit],
        state: &mut AggregatorState,
        report: &mut RunReport,
    ) -> Result<()> {
        for (index, unit) in inputs.iter().enumerate() {
            if self.is_cancelled() {
                self.mark_cancelled(&inputs[index..], report);
                break;
            }

            let outcome = self.process_combined(unit, state)?;
            self.notify(&outcome);
            report.inputs.push(outcome);
        }

        Ok(())
    }

    fn process_combined(&self, unit: &InputUnit, state: &mut AggregatorState) -> Result<InputOutcome> {
        log::info!("Processing '{}'", unit.file_name);

        let mut outcome = InputOutcome::new(unit);
        let scratch = self.create_scratch()?;

        if let Err(e) = self.extractor.extract(&unit.path, scratch.path()) {
            log::error!("Extraction failed for '{}': {}", unit.file_name, e);
            outcome.mark_failed(e.to_string());
            discard_scratch(scratch, &unit.file_name);
            return Ok(outcome);
        }

        let appended = TreeScanner::new().scan(scratch.path()).and_then(|tree| {
            outcome.files_found = tree.len();
            log_tree_statistics(&tree);
            state.append_input(&unit.file_name, &tree.grouped())
        });
        discard_scratch(scratch, &unit.file_name);

        outcome.files_bundled = appended?;
        outcome.status = InputStatus::Done;

        Ok(outcome)
    }

    fn create_scratch(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("decompack-");

        let scratch = match &self.config.extractor.scratch_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };

        log::debug!("Created scratch directory {}", scratch.path().display());
        Ok(scratch)
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.is_some_and(|shutdown| !shutdown.is_running())
    }

    fn mark_cancelled(&self, remaining: &[InputUnit], report: &mut RunReport) {
        log::warn!("Cancellation requested; skipping {} remaining input(s)", remaining.len());
        report.cancelled = true;

        for unit in remaining {
            let mut outcome = InputOutcome::new(unit);
            outcome.status = InputStatus::Cancelled;
            report.inputs.push(outcome);
        }
    }

    fn notify(&self, outcome: &InputOutcome) {
        if let Some(callback) = self.on_input_done {
            callback(outcome);
        }
    }

    fn save_reports(&self, report: &RunReport) {
        if !self.config.output.generate_report {
            return;
        }

        let areas: Vec<&Path> = match report.topology {
            Topology::Combined => report.output_areas.iter().map(|p| p.as_path()).collect(),
            Topology::Individual => report
                .inputs
                .iter()
                .filter(|o| o.is_done())
                .filter_map(|o| o.output_area.as_deref())
                .collect(),
        };

        for area in areas {
            match write_report(area, report) {
                Ok(path) => log::debug!("Saved run report to {}", path.display()),
                Err(e) => log::warn!("Failed to save run report in {}: {}", area.display(), e),
            }
        }
    }
}

fn bundle_file_count(grouped: &crate::scanner::GroupedFiles) -> usize {
    grouped
        .iter()
        .filter(|(key, _)| !key.is_binary())
        .map(|(_, files)| files.len())
        .sum()
}

fn log_tree_statistics(tree: &ExtractedTree) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("{}", tree.get_statistics().display_summary());
    }
}

fn discard_scratch(scratch: TempDir, input_name: &str) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        log::warn!(
            "Failed to remove scratch directory {} for '{}': {}",
            path.display(),
            input_name,
            e
        );
    }
}
