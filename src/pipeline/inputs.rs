use crate::error::{DecompackError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One source archive, processed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputUnit {
    pub path: PathBuf,
    /// File name without its extension; names the output area and archives.
    pub name: String,
    pub file_name: String,
}

impl InputUnit {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            path,
            name,
            file_name,
        }
    }
}

/// Lists the regular files directly inside `directory` whose extension
/// matches `extension` (case-insensitive), sorted by path.
pub fn discover_inputs(directory: &Path, extension: &str) -> Result<Vec<InputUnit>> {
    if !directory.is_dir() {
        return Err(DecompackError::InvalidInputDirectory {
            path: directory.display().to_string(),
        });
    }

    let wanted = extension.trim_start_matches('.').to_lowercase();
    let mut paths = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type()?.is_file() && !path.is_file() {
            continue;
        }

        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == wanted)
            .unwrap_or(false);

        if matches {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(DecompackError::NoInputsFound {
            directory: directory.display().to_string(),
            extension: wanted,
        });
    }

    paths.sort();
    log::info!("Found {} .{} files to process", paths.len(), wanted);

    Ok(paths.into_iter().map(InputUnit::from_path).collect())
}

/// Name used for the combined output area: the input directory's own name.
pub fn input_dir_name(directory: &Path) -> String {
    directory
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .or_else(|| {
            directory
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "inputs".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_matching_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["zeta.jar", "alpha.JAR", "notes.txt", "mid.jar"] {
            fs::write(temp_dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested.jar")).unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub/deep.jar"), b"").unwrap();

        let inputs = discover_inputs(temp_dir.path(), "jar").unwrap();
        let names: Vec<&str> = inputs.iter().map(|u| u.file_name.as_str()).collect();

        assert_eq!(names, vec!["alpha.JAR", "mid.jar", "zeta.jar"]);
        assert_eq!(inputs[0].name, "alpha");
    }

    #[test]
    fn test_extension_filter_is_configurable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.war"), b"").unwrap();
        fs::write(temp_dir.path().join("lib.jar"), b"").unwrap();

        let inputs = discover_inputs(temp_dir.path(), ".war").unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "app");
    }

    #[test]
    fn test_no_matching_inputs() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("readme.md"), b"").unwrap();

        let result = discover_inputs(temp_dir.path(), "jar");
        assert!(matches!(result, Err(DecompackError::NoInputsFound { .. })));
    }

    #[test]
    fn test_invalid_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.jar");
        fs::write(&file, b"").unwrap();

        assert!(matches!(
            discover_inputs(&file, "jar"),
            Err(DecompackError::InvalidInputDirectory { .. })
        ));
        assert!(matches!(
            discover_inputs(&temp_dir.path().join("missing"), "jar"),
            Err(DecompackError::InvalidInputDirectory { .. })
        ));
    }

    #[test]
    fn test_input_dir_name() {
        let temp_dir = TempDir::new().unwrap();
        let libs = temp_dir.path().join("libs");
        fs::create_dir(&libs).unwrap();

        assert_eq!(input_dir_name(&libs), "libs");
        assert_eq!(input_dir_name(&libs.join(".")), "libs");
    }
}
