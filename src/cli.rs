use crate::config::{ArchiveMode, CliOverrides, Config, ExtractorKind};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "decompack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decompile a directory of JAR files and repackage the sources into bounded bundles")]
#[command(
    long_about = "decompack decompiles every archive in a directory, groups the extracted files \
                  by extension, concatenates them into size-bounded text bundles and packs the \
                  results into numbered ZIP archives, either per archive or combined."
)]
#[command(before_help = "📦 decompack - JAR decompile & context packer")]
#[command(after_help = "EXAMPLES:\n  \
    decompack ./libs\n  \
    decompack ./libs --combine --max-size 50\n  \
    decompack ./libs --mode direct -s 25 --output ./packed\n  \
    decompack ./libs --extractor unzip --extension war\n  \
    decompack --generate-config --config decompack.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory containing the archives to process
    #[arg(required_unless_present = "generate_config")]
    pub input_directory: Option<PathBuf>,

    /// Merge every archive into one shared set of bundles
    #[arg(long)]
    pub combine: bool,

    /// Archive raw files (direct) or per-type bundles (context)
    #[arg(long, value_enum)]
    pub mode: Option<ArchiveMode>,

    /// Maximum number of files per ZIP archive
    #[arg(short, long, value_parser = parse_files_per_archive)]
    pub size: Option<usize>,

    /// Maximum size of each context bundle, in MB
    #[arg(long, value_parser = parse_megabytes)]
    pub max_size: Option<f64>,

    /// Base directory for output areas (defaults to the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// How archives are extracted before packing
    #[arg(long, value_enum)]
    pub extractor: Option<ExtractorKind>,

    /// Path to the Vineflower decompiler jar (searched for when omitted)
    #[arg(long, env = "DECOMPACK_DECOMPILER")]
    pub decompiler: Option<PathBuf>,

    /// Java executable used to run the decompiler
    #[arg(long, env = "DECOMPACK_JAVA")]
    pub java: Option<String>,

    /// Extension of the input archives to process
    #[arg(long)]
    pub extension: Option<String>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Replace output areas that already exist
    #[arg(long, help = "Overwrite existing output directories")]
    pub force: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "List inputs and output areas without processing anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_files_per_archive(self.size)
            .with_max_bundle_mb(self.max_size)
            .with_mode(self.mode)
            .with_combine(self.combine)
            .with_extension(self.extension.clone())
            .with_output_dir(self.output.clone())
            .with_force(self.force)
            .with_extractor(self.extractor)
            .with_decompiler_jar(self.decompiler.clone())
            .with_java_command(self.java.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn parse_files_per_archive(s: &str) -> std::result::Result<usize, String> {
    let value: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number of files: {}", s))?;

    if value == 0 {
        return Err("Files per archive must be at least 1".to_string());
    }

    Ok(value)
}

pub fn parse_megabytes(s: &str) -> std::result::Result<f64, String> {
    let s = s.trim().to_lowercase();
    let number_str = s.strip_suffix("mb").unwrap_or(&s).trim();

    let value: f64 = number_str
        .parse()
        .map_err(|_| format!("Invalid size in MB: {}", number_str))?;

    if !value.is_finite() || value <= 0.0 {
        return Err("Size must be a positive number of megabytes".to_string());
    }

    Ok(value)
}
