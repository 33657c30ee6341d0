use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecompackError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input path is not a directory: {path}")]
    InvalidInputDirectory { path: String },

    #[error("No .{extension} files found in {directory}")]
    NoInputsFound { directory: String, extension: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Decompiler jar not found in {search_dir}")]
    DecompilerNotFound { search_dir: String },

    #[error("Extraction failed for {input}: {message}")]
    ExtractionFailed { input: String, message: String },

    #[error("Failed to write archive {path}")]
    ArchiveWrite {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Output directory already exists: {path}")]
    OutputDirectoryExists { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for DecompackError {
    fn user_message(&self) -> String {
        match self {
            DecompackError::InvalidInputDirectory { path } => {
                format!("Provided path '{}' is not a valid directory", path)
            }
            DecompackError::NoInputsFound {
                directory,
                extension,
            } => {
                format!("No .{} files found in '{}'", extension, directory)
            }
            DecompackError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            DecompackError::DecompilerNotFound { search_dir } => {
                format!("Could not find a decompiler jar in '{}'", search_dir)
            }
            DecompackError::ExtractionFailed { input, message } => {
                format!("Could not extract '{}': {}", input, message)
            }
            DecompackError::ArchiveWrite { path, source } => {
                format!("Failed to write archive {}: {}", path, source)
            }
            DecompackError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            DecompackError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            DecompackError::OutputDirectoryExists { path } => {
                format!("Output directory already exists: {}", path)
            }
            DecompackError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DecompackError::InvalidInputDirectory { .. } => Some(
                "Pass the directory that contains the archives to process, not an archive itself.".to_string()
            ),
            DecompackError::NoInputsFound { .. } => Some(
                "Check the directory or select another input type with --extension.".to_string()
            ),
            DecompackError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all values are in range.".to_string()
            ),
            DecompackError::DecompilerNotFound { .. } => Some(
                "Download a Vineflower release jar into that directory, or point to one with --decompiler.".to_string()
            ),
            DecompackError::ExtractionFailed { .. } => Some(
                "Make sure Java is installed and on your PATH, or use --extractor unzip to skip decompilation.".to_string()
            ),
            DecompackError::ArchiveWrite { .. } => Some(
                "Check free disk space and write permissions for the output directory.".to_string()
            ),
            DecompackError::Permission { .. } => Some(
                "Ensure you have the necessary read/write permissions for the target directory.".to_string()
            ),
            DecompackError::OutputDirectoryExists { .. } => Some(
                "Remove the existing directory, choose a different base directory with --output, or use --force to overwrite.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for DecompackError {
    fn from(error: toml::de::Error) -> Self {
        DecompackError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecompackError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = DecompackError::InvalidInputDirectory {
            path: "missing".to_string(),
        };
        assert!(error.user_message().contains("not a valid directory"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_extraction_failure_message_names_input() {
        let error = DecompackError::ExtractionFailed {
            input: "broken.jar".to_string(),
            message: "exit status 1".to_string(),
        };
        assert!(error.user_message().contains("broken.jar"));
        assert!(error.to_string().contains("exit status 1"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(500), "500 B");
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let error = DecompackError::from(toml_error);
        assert!(matches!(error, DecompackError::Config { .. }));
    }
}
