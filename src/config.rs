use crate::error::{DecompackError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// How archives are built from one extracted tree in Individual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Zip the raw extracted files
    Direct,
    /// Concatenate files into per-type context bundles, then zip the bundles
    Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Decompile with a Vineflower jar through `java -jar`
    Vineflower,
    /// Unpack the archive entries as-is
    Unzip,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub files_per_archive: usize,
    pub max_bundle_mb: f64,
    pub mode: ArchiveMode,
    pub combine: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_directory: PathBuf,
    pub generate_report: bool,
    pub force_overwrite: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub kind: ExtractorKind,
    pub java_command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decompiler_jar: Option<PathBuf>,
    pub search_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            files_per_archive: 10,
            max_bundle_mb: 100.0,
            mode: ArchiveMode::Context,
            combine: false,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extension: "jar".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            generate_report: true,
            force_overwrite: false,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            kind: ExtractorKind::Vineflower,
            java_command: "java".to_string(),
            decompiler_jar: None,
            search_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            scratch_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DecompackError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DecompackError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| DecompackError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["decompack.toml", ".decompack.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(size) = cli_args.files_per_archive {
            self.archive.files_per_archive = size;
        }

        if let Some(max_size) = cli_args.max_bundle_mb {
            self.archive.max_bundle_mb = max_size;
        }

        if let Some(mode) = cli_args.mode {
            self.archive.mode = mode;
        }

        if cli_args.combine {
            self.archive.combine = true;
        }

        if let Some(ref extension) = cli_args.extension {
            self.input.extension = extension.trim().trim_start_matches('.').to_lowercase();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.base_directory = output_dir.clone();
        }

        if cli_args.force {
            self.output.force_overwrite = true;
        }

        if let Some(kind) = cli_args.extractor {
            self.extractor.kind = kind;
        }

        if let Some(ref jar) = cli_args.decompiler_jar {
            self.extractor.decompiler_jar = Some(jar.clone());
        }

        if let Some(ref java) = cli_args.java_command {
            self.extractor.java_command = java.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.files_per_archive == 0 {
            return Err(DecompackError::Config {
                message: "Files per archive must be greater than 0".to_string(),
            });
        }

        if !self.archive.max_bundle_mb.is_finite() || self.archive.max_bundle_mb <= 0.0 {
            return Err(DecompackError::Config {
                message: "Maximum bundle size must be a positive number of megabytes".to_string(),
            });
        }

        if self.input.extension.is_empty() {
            return Err(DecompackError::Config {
                message: "An input file extension must be specified".to_string(),
            });
        }

        if self.extractor.kind == ExtractorKind::Vineflower && self.extractor.java_command.is_empty()
        {
            return Err(DecompackError::Config {
                message: "Java command must not be empty".to_string(),
            });
        }

        if let Some(parent) = self.output.base_directory.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(DecompackError::Config {
                    message: format!("Parent directory does not exist: {}", parent.display()),
                });
            }
        }

        Ok(())
    }

    /// Bundle ceiling in bytes; megabytes are binary (`value * 1024 * 1024`).
    pub fn max_bundle_bytes(&self) -> u64 {
        (self.archive.max_bundle_mb * 1024.0 * 1024.0) as u64
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub files_per_archive: Option<usize>,
    pub max_bundle_mb: Option<f64>,
    pub mode: Option<ArchiveMode>,
    pub combine: bool,
    pub extension: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub force: bool,
    pub extractor: Option<ExtractorKind>,
    pub decompiler_jar: Option<PathBuf>,
    pub java_command: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files_per_archive(mut self, size: Option<usize>) -> Self {
        self.files_per_archive = size;
        self
    }

    pub fn with_max_bundle_mb(mut self, max_size: Option<f64>) -> Self {
        self.max_bundle_mb = max_size;
        self
    }

    pub fn with_mode(mut self, mode: Option<ArchiveMode>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_combine(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_extractor(mut self, extractor: Option<ExtractorKind>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_decompiler_jar(mut self, jar: Option<PathBuf>) -> Self {
        self.decompiler_jar = jar;
        self
    }

    pub fn with_java_command(mut self, java: Option<String>) -> Self {
        self.java_command = java;
        self
    }
}
