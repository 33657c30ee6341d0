use crate::error::{DecompackError, Result};
use crate::extractor::Extractor;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use zip::ZipArchive;

/// Unpacks an archive's entries as-is, without decompiling. Entries whose
/// names would escape the scratch root are skipped.
#[derive(Debug, Default)]
pub struct UnzipExtractor;

impl UnzipExtractor {
    pub fn new() -> Self {
        Self
    }

    fn unpack(&self, input: &Path, scratch: &Path) -> std::result::Result<usize, String> {
        let file = File::open(input).map_err(|e| format!("failed to open archive: {e}"))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| format!("invalid or corrupt archive: {e}"))?;

        let mut count = 0;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| format!("failed to read entry {i}: {e}"))?;

            let Some(entry_path) = entry.enclosed_name() else {
                log::warn!("Skipping unsafe entry name '{}'", entry.name());
                continue;
            };
            let output_path = scratch.join(entry_path);

            if entry.is_dir() {
                fs::create_dir_all(&output_path)
                    .map_err(|e| format!("failed to create directory: {e}"))?;
            } else {
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| format!("failed to create directory: {e}"))?;
                }
                let mut outfile = File::create(&output_path)
                    .map_err(|e| format!("failed to create file: {e}"))?;
                io::copy(&mut entry, &mut outfile)
                    .map_err(|e| format!("failed to write file: {e}"))?;
                count += 1;
            }
        }

        Ok(count)
    }
}

impl Extractor for UnzipExtractor {
    fn extract(&self, input: &Path, scratch: &Path) -> Result<()> {
        let input_name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.display().to_string());

        let count = self
            .unpack(input, scratch)
            .map_err(|message| DecompackError::ExtractionFailed {
                input: input_name.clone(),
                message,
            })?;

        log::info!("Unpacked {} entries from '{}'", count, input_name);
        Ok(())
    }

    fn name(&self) -> &str {
        "unzip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TreeScanner;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn create_test_jar(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let jar_path = dir.join(name);
        let file = File::create(&jar_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        for (entry_name, content) in files {
            writer.start_file(entry_name.to_string(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        jar_path
    }

    #[test]
    fn test_unpacks_nested_entries() {
        let source = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let jar = create_test_jar(
            source.path(),
            "lib.jar",
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("com/example/Main.java", b"class Main {}"),
            ],
        );

        UnzipExtractor::new().extract(&jar, scratch.path()).unwrap();

        let tree = TreeScanner::new().scan(scratch.path()).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            fs::read_to_string(scratch.path().join("com/example/Main.java")).unwrap(),
            "class Main {}"
        );
    }

    #[test]
    fn test_corrupt_archive_is_extraction_failure() {
        let source = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let bogus = source.path().join("broken.jar");
        fs::write(&bogus, b"this is not a zip archive").unwrap();

        let result = UnzipExtractor::new().extract(&bogus, scratch.path());
        match result {
            Err(DecompackError::ExtractionFailed { input, .. }) => assert_eq!(input, "broken.jar"),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }
}
