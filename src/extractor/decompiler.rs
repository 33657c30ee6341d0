use crate::error::{DecompackError, Result};
use crate::extractor::Extractor;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs the Vineflower decompiler through a Java runtime:
/// `<java> -jar <decompiler> <input> --outputdir <scratch>`.
pub struct JavaDecompiler {
    java_command: String,
    decompiler_jar: PathBuf,
}

impl JavaDecompiler {
    pub fn new<P: Into<PathBuf>>(decompiler_jar: P) -> Self {
        Self {
            java_command: "java".to_string(),
            decompiler_jar: decompiler_jar.into(),
        }
    }

    pub fn with_java_command<S: Into<String>>(mut self, java: S) -> Self {
        self.java_command = java.into();
        self
    }

    fn build_command(&self, input: &Path, scratch: &Path) -> Command {
        let mut command = Command::new(&self.java_command);
        command
            .arg("-jar")
            .arg(&self.decompiler_jar)
            .arg(input)
            .arg("--outputdir")
            .arg(scratch);
        command
    }
}

impl Extractor for JavaDecompiler {
    fn extract(&self, input: &Path, scratch: &Path) -> Result<()> {
        let input_name = display_name(input);
        log::info!("Decompiling '{}'...", input_name);

        let output = match self.build_command(input, scratch).output() {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DecompackError::ExtractionFailed {
                    input: input_name,
                    message: format!(
                        "'{}' is not installed or not in your system's PATH",
                        self.java_command
                    ),
                });
            }
            Err(e) => {
                return Err(DecompackError::ExtractionFailed {
                    input: input_name,
                    message: format!("failed to start decompiler: {}", e),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecompackError::ExtractionFailed {
                input: input_name,
                message: format!("decompiler exited with {}: {}", output.status, stderr.trim()),
            });
        }

        log::info!("Successfully decompiled '{}'", input_name);
        Ok(())
    }

    fn name(&self) -> &str {
        "vineflower"
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct DecompilerCandidate {
    version: (u32, u32, u32),
    full_build: bool,
    path: PathBuf,
}

/// Finds the best `vineflower-<major>.<minor>.<patch>[-slim].jar` in
/// `search_dir`: highest version first, full build over slim.
pub fn locate_decompiler(search_dir: &Path) -> Result<PathBuf> {
    let not_found = || DecompackError::DecompilerNotFound {
        search_dir: search_dir.display().to_string(),
    };

    let pattern = Regex::new(r"^vineflower-(\d+)\.(\d+)\.(\d+)(-slim)?\.jar$").map_err(|e| {
        DecompackError::Config {
            message: format!("invalid decompiler pattern: {}", e),
        }
    })?;

    let entries = fs::read_dir(search_dir).map_err(|_| not_found())?;

    let mut best: Option<DecompilerCandidate> = None;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        let Some(captures) = pattern.captures(&file_name) else {
            continue;
        };

        let part = |i: usize| {
            captures
                .get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };

        let candidate = DecompilerCandidate {
            version: (part(1), part(2), part(3)),
            full_build: captures.get(4).is_none(),
            path: entry.path(),
        };
        log::debug!("Found decompiler candidate {}", candidate.path.display());

        if best.as_ref().map_or(true, |current| candidate > *current) {
            best = Some(candidate);
        }
    }

    best.map(|candidate| candidate.path).ok_or_else(not_found)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
