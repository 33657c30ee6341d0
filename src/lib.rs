pub mod archiver;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{
    ArchiveConfig, ArchiveMode, CliOverrides, Config, ExtractorConfig, ExtractorKind, InputConfig,
    OutputConfig,
};
pub use error::{DecompackError, Result, UserFriendlyError};

// Core functionality re-exports
pub use archiver::pack;
pub use bundler::{create_bundles, AggregatorState, BundleWriter, HeaderStyle};
pub use extractor::{locate_decompiler, Extractor, JavaDecompiler, OutputArea, UnzipExtractor};
pub use pipeline::{
    discover_inputs, InputOutcome, InputStatus, InputUnit, Orchestrator, RunPlan, RunReport,
    Topology,
};
pub use scanner::{classify, ClassificationKey, ExtractedTree, TreeScanner};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface: discovers archives, then extracts, bundles and
/// packs them according to the loaded configuration.
pub struct Decompack {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl Decompack {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance for testing (no signal handler registration)
    #[cfg(test)]
    pub fn new_for_test(config: Config) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(OutputMode::Plain, 0, true),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        )
    }

    /// Builds the configured extractor. For Vineflower this resolves the
    /// decompiler jar, searching `extractor.search_dir` when none is set.
    pub fn build_extractor(&self) -> Result<Box<dyn Extractor>> {
        let settings = &self.config.extractor;

        match settings.kind {
            ExtractorKind::Unzip => Ok(Box::new(UnzipExtractor::new())),
            ExtractorKind::Vineflower => {
                let jar = match &settings.decompiler_jar {
                    Some(jar) if jar.is_file() => jar.clone(),
                    Some(jar) => {
                        return Err(DecompackError::DecompilerNotFound {
                            search_dir: jar.display().to_string(),
                        })
                    }
                    None => locate_decompiler(&settings.search_dir)?,
                };
                log::info!("Using decompiler {}", jar.display());

                Ok(Box::new(
                    JavaDecompiler::new(jar).with_java_command(settings.java_command.clone()),
                ))
            }
        }
    }

    pub fn discover(&self, input_dir: &Path) -> Result<Vec<InputUnit>> {
        discover_inputs(input_dir, &self.config.input.extension)
    }

    /// Describes what `run` would do without touching the filesystem.
    /// Returns `None` when the directory holds no matching inputs.
    pub fn plan(&self, input_dir: &Path) -> Result<Option<RunPlan>> {
        let Some(inputs) = self.discover_or_warn(input_dir)? else {
            return Ok(None);
        };
        let extractor = self.build_extractor()?;
        let orchestrator = Orchestrator::new(&self.config, extractor.as_ref());

        Ok(Some(orchestrator.plan(input_dir, &inputs)))
    }

    /// Processes every matching archive in `input_dir`. Returns `None` when
    /// there is nothing to do.
    pub fn run(&self, input_dir: &Path) -> Result<Option<RunReport>> {
        self.shutdown.check_shutdown()?;

        let Some(inputs) = self.discover_or_warn(input_dir)? else {
            return Ok(None);
        };
        let extractor = self.build_extractor()?;

        self.output_formatter.start_operation(&format!(
            "Processing {} archive(s) with {}",
            inputs.len(),
            extractor.name()
        ));

        let progress = self.progress_manager.create_input_progress(inputs.len() as u64);
        let on_input_done =
            |outcome: &InputOutcome| ui::progress::update_input_progress(&progress, outcome);

        let orchestrator = Orchestrator::new(&self.config, extractor.as_ref())
            .with_shutdown(&self.shutdown)
            .with_progress(&on_input_done);

        let report = match orchestrator.run(input_dir, &inputs) {
            Ok(report) => report,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &progress,
            &format!("Processed {} archive(s)", report.inputs.len()),
            report.duration,
        );

        if report.cancelled {
            self.output_formatter.print_run_report(&report);
            return Err(DecompackError::Cancelled);
        }

        Ok(Some(report))
    }

    fn discover_or_warn(&self, input_dir: &Path) -> Result<Option<Vec<InputUnit>>> {
        match self.discover(input_dir) {
            Ok(inputs) => Ok(Some(inputs)),
            Err(e @ DecompackError::NoInputsFound { .. }) => {
                self.output_formatter.warning(&e.user_message());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &DecompackError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
