use crate::bundler::bundle_writer::{BundleStats, BundleWriter, HeaderStyle};
use crate::error::Result;
use crate::scanner::GroupedFiles;
use std::path::{Path, PathBuf};

/// Concatenates one extracted tree into per-type bundles inside `output_dir`.
///
/// Each key's bundle is closed once its group is written, so at most one
/// handle is open at a time. Headers name files relative to `base_dir`.
/// The returned paths are unordered; the packer sorts them.
pub fn create_bundles(
    grouped: &GroupedFiles,
    output_dir: &Path,
    base_dir: &Path,
    max_bundle_bytes: u64,
) -> Result<Vec<PathBuf>> {
    log::info!("Creating context files in '{}'", output_dir.display());

    let mut writer = BundleWriter::new(output_dir, max_bundle_bytes);
    let style = HeaderStyle::Relative { base_dir };

    for (key, files) in grouped {
        writer.append_group(key, files, &style)?;
        writer.close_key(key)?;
    }

    writer.close()
}

/// Bundle state shared by every input of a combined run.
///
/// Handles stay open between inputs so records from later archives are
/// appended to the same bundle files. Call [`AggregatorState::close`] once
/// after the last input; dropping the state without closing still flushes
/// every handle.
pub struct AggregatorState {
    writer: BundleWriter,
    inputs_appended: usize,
}

impl AggregatorState {
    pub fn new<P: Into<PathBuf>>(output_dir: P, max_bundle_bytes: u64) -> Self {
        Self {
            writer: BundleWriter::new(output_dir, max_bundle_bytes),
            inputs_appended: 0,
        }
    }

    /// Appends every text file of one input, stamping each record with
    /// `source_name`. Returns the number of files appended.
    pub fn append_input(&mut self, source_name: &str, grouped: &GroupedFiles) -> Result<usize> {
        let style = HeaderStyle::Sourced {
            source: source_name,
        };

        let mut appended = 0;
        for (key, files) in grouped {
            appended += self.writer.append_group(key, files, &style)?;
        }

        self.inputs_appended += 1;
        log::debug!(
            "Appended {} files from {} ({} bundle handles open)",
            appended,
            source_name,
            self.writer.open_count()
        );

        Ok(appended)
    }

    pub fn inputs_appended(&self) -> usize {
        self.inputs_appended
    }

    pub fn stats(&self) -> BundleStats {
        self.writer.stats()
    }

    pub fn close(&mut self) -> Result<Vec<PathBuf>> {
        log::info!("Closing all context files...");
        self.writer.close()
    }
}
