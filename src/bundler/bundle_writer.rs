use crate::error::Result;
use crate::scanner::ClassificationKey;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 64 * 1024;

/// How each concatenated file segment is introduced in a bundle.
#[derive(Debug, Clone, Copy)]
pub enum HeaderStyle<'a> {
    /// One banner line naming the file relative to `base_dir`.
    Relative { base_dir: &'a Path },
    /// A block naming the source archive and the file name, for bundles
    /// shared by several inputs.
    Sourced { source: &'a str },
}

impl HeaderStyle<'_> {
    pub fn render(&self, file: &Path) -> String {
        match self {
            HeaderStyle::Relative { base_dir } => {
                let relative = file.strip_prefix(base_dir).unwrap_or(file);
                let rule = "=".repeat(25);
                format!("\n{} START: {} {}\n\n", rule, relative.display(), rule)
            }
            HeaderStyle::Sourced { source } => {
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| file.to_string_lossy());
                let rule = "=".repeat(30);
                format!(
                    "\n{}\n=== SOURCE JAR: {}\n=== FILE:       {}\n{}\n\n",
                    rule, source, file_name, rule
                )
            }
        }
    }
}

/// Reads a file as text. Invalid UTF-8 is decoded as Windows-1252, which
/// maps every byte, so no content is ever dropped.
pub fn read_text_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            log::debug!("{} is not valid UTF-8, decoding as Windows-1252", path.display());
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
            Ok(text.into_owned())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { bytes: u64 },
    Skipped,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BundleStats {
    pub files_appended: usize,
    pub files_skipped: usize,
    pub bytes_appended: u64,
}

struct OpenBundle {
    path: PathBuf,
    writer: BufWriter<File>,
    part: u32,
    size: u64,
}

/// Last part of a key whose handle was released with `close_key`.
#[derive(Debug, Clone, Copy)]
struct ClosedPart {
    part: u32,
    size: u64,
}

/// Per-key bundle state: the open handle, its part number and the source
/// bytes it holds so far.
pub struct BundleWriter {
    output_dir: PathBuf,
    max_bundle_bytes: u64,
    open: BTreeMap<ClassificationKey, OpenBundle>,
    closed: BTreeMap<ClassificationKey, ClosedPart>,
    created: Vec<PathBuf>,
    stats: BundleStats,
}

impl BundleWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P, max_bundle_bytes: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_bundle_bytes,
            open: BTreeMap::new(),
            closed: BTreeMap::new(),
            created: Vec::new(),
            stats: BundleStats::default(),
        }
    }

    pub fn bundle_path(&self, key: &ClassificationKey, part: u32) -> PathBuf {
        self.output_dir
            .join(format!("{}_context_{}.txt", key.stem(), part))
    }

    /// Appends every file of one group, sorted by path. Binary keys are
    /// skipped as a whole.
    pub fn append_group(
        &mut self,
        key: &ClassificationKey,
        files: &[PathBuf],
        style: &HeaderStyle<'_>,
    ) -> Result<usize> {
        if key.is_binary() {
            log::info!("Skipping binary file type: {} ({} files)", key, files.len());
            return Ok(0);
        }

        let mut sorted = files.to_vec();
        sorted.sort();

        let mut appended = 0;
        for file in &sorted {
            if let AppendOutcome::Appended { .. } = self.append_file(key, file, style)? {
                appended += 1;
            }
        }

        Ok(appended)
    }

    pub fn append_file(
        &mut self,
        key: &ClassificationKey,
        file: &Path,
        style: &HeaderStyle<'_>,
    ) -> Result<AppendOutcome> {
        let file_size = match fs::metadata(file) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::debug!("Skipping {} (stat failed: {})", file.display(), e);
                self.stats.files_skipped += 1;
                return Ok(AppendOutcome::Skipped);
            }
        };

        let content = match read_text_lossy(file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Skipping {} (removed before read)", file.display());
                self.stats.files_skipped += 1;
                return Ok(AppendOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.open.contains_key(key) {
            match self.closed.remove(key) {
                Some(closed) => self.reopen_bundle(key, closed)?,
                None => self.open_bundle(key, 1)?,
            }
        }

        let needs_rotation = self.open.get(key).is_some_and(|bundle| {
            bundle.size > 0 && bundle.size + file_size > self.max_bundle_bytes
        });

        if needs_rotation {
            if let Some(mut bundle) = self.open.remove(key) {
                bundle.writer.flush()?;
                let next_part = bundle.part + 1;
                log::debug!(
                    "Bundle {} reached {} bytes, starting part {}",
                    bundle.path.display(),
                    bundle.size,
                    next_part
                );
                self.open_bundle(key, next_part)?;
            }
        }

        let header = style.render(file);
        if let Some(bundle) = self.open.get_mut(key) {
            bundle.writer.write_all(header.as_bytes())?;
            bundle.writer.write_all(content.as_bytes())?;
            bundle.size += file_size;
        }

        self.stats.files_appended += 1;
        self.stats.bytes_appended += file_size;

        Ok(AppendOutcome::Appended { bytes: file_size })
    }

    fn open_bundle(&mut self, key: &ClassificationKey, part: u32) -> Result<()> {
        let path = self.bundle_path(key, part);
        let file = File::create(&path)?;

        self.created.push(path.clone());
        self.open.insert(
            key.clone(),
            OpenBundle {
                path,
                writer: BufWriter::with_capacity(BUFFER_SIZE, file),
                part,
                size: 0,
            },
        );
        Ok(())
    }

    /// Continues a released part in append mode, keeping its size so the
    /// bound still applies.
    fn reopen_bundle(&mut self, key: &ClassificationKey, closed: ClosedPart) -> Result<()> {
        let path = self.bundle_path(key, closed.part);
        let file = OpenOptions::new().append(true).create(true).open(&path)?;

        self.open.insert(
            key.clone(),
            OpenBundle {
                path,
                writer: BufWriter::with_capacity(BUFFER_SIZE, file),
                part: closed.part,
                size: closed.size,
            },
        );
        Ok(())
    }

    /// Flushes and releases the handle for one key. A later append for the
    /// same key resumes its last part.
    pub fn close_key(&mut self, key: &ClassificationKey) -> Result<()> {
        if let Some(mut bundle) = self.open.remove(key) {
            bundle.writer.flush()?;
            self.closed.insert(
                key.clone(),
                ClosedPart {
                    part: bundle.part,
                    size: bundle.size,
                },
            );
        }
        Ok(())
    }

    /// Flushes and releases every handle, returning all bundles created.
    /// Every handle is released even when one of them fails to flush.
    pub fn close(&mut self) -> Result<Vec<PathBuf>> {
        let mut first_error = None;

        for (key, mut bundle) in std::mem::take(&mut self.open) {
            if let Err(e) = bundle.writer.flush() {
                log::warn!("Failed to flush bundle for {}: {}", key, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(std::mem::take(&mut self.created)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn stats(&self) -> BundleStats {
        self.stats
    }
}

impl Drop for BundleWriter {
    fn drop(&mut self) {
        for (key, bundle) in self.open.iter_mut() {
            if let Err(e) = bundle.writer.flush() {
                log::warn!("Failed to flush bundle for {} on release: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(ext: &str) -> ClassificationKey {
        ClassificationKey::from_extension(Some(ext))
    }

    fn write_file(dir: &Path, name: &str, size: usize, fill: u8) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![fill; size]).unwrap();
        path
    }

    #[test]
    fn test_relative_header() {
        let style = HeaderStyle::Relative {
            base_dir: Path::new("/scratch"),
        };
        let header = style.render(Path::new("/scratch/com/example/Main.java"));
        let expected_path = Path::new("com/example/Main.java").display().to_string();
        assert_eq!(
            header,
            format!(
                "\n========================= START: {} =========================\n\n",
                expected_path
            )
        );
    }

    #[test]
    fn test_sourced_header() {
        let style = HeaderStyle::Sourced {
            source: "library.jar",
        };
        let header = style.render(Path::new("/scratch/com/example/Main.java"));
        assert!(header.contains("=== SOURCE JAR: library.jar\n"));
        assert!(header.contains("=== FILE:       Main.java\n"));
        assert!(header.starts_with(&format!("\n{}\n", "=".repeat(30))));
    }

    #[test]
    fn test_read_text_lossy_falls_back_for_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        assert_eq!(read_text_lossy(&path).unwrap(), "café");
    }

    #[test]
    fn test_read_text_lossy_keeps_valid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("utf8.txt");
        fs::write(&path, "naïve ☕").unwrap();

        assert_eq!(read_text_lossy(&path).unwrap(), "naïve ☕");
    }

    #[test]
    fn test_rotation_when_next_file_exceeds_bound() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![
            write_file(source.path(), "a.txt", 40, b'a'),
            write_file(source.path(), "b.txt", 40, b'b'),
            write_file(source.path(), "c.txt", 40, b'c'),
        ];

        let mut writer = BundleWriter::new(output.path(), 100);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        let appended = writer.append_group(&key("txt"), &files, &style).unwrap();
        let created = writer.close().unwrap();

        assert_eq!(appended, 3);
        assert_eq!(created.len(), 2);

        let part1 = fs::read_to_string(output.path().join("txt_context_1.txt")).unwrap();
        let part2 = fs::read_to_string(output.path().join("txt_context_2.txt")).unwrap();
        assert!(part1.contains(&"a".repeat(40)) && part1.contains(&"b".repeat(40)));
        assert!(!part1.contains(&"c".repeat(40)));
        assert!(part2.contains(&"c".repeat(40)));
    }

    #[test]
    fn test_oversized_file_is_never_split() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![
            write_file(source.path(), "a_big.txt", 500, b'x'),
            write_file(source.path(), "b_small.txt", 10, b'y'),
        ];

        let mut writer = BundleWriter::new(output.path(), 100);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        writer.append_group(&key("txt"), &files, &style).unwrap();
        let created = writer.close().unwrap();

        assert_eq!(created.len(), 2);
        let part1 = fs::read_to_string(output.path().join("txt_context_1.txt")).unwrap();
        assert!(part1.contains(&"x".repeat(500)));
        assert!(!part1.contains('y'));
    }

    #[test]
    fn test_binary_group_is_skipped() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = vec![write_file(source.path(), "icon.png", 10, 0x89)];

        let mut writer = BundleWriter::new(output.path(), 100);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        let appended = writer.append_group(&key("png"), &files, &style).unwrap();

        assert_eq!(appended, 0);
        assert!(writer.close().unwrap().is_empty());
        assert!(!output.path().join("png_context_1.txt").exists());
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let present = write_file(source.path(), "present.txt", 5, b'p');
        let missing = source.path().join("gone.txt");

        let mut writer = BundleWriter::new(output.path(), 100);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        let appended = writer
            .append_group(&key("txt"), &[missing, present], &style)
            .unwrap();

        assert_eq!(appended, 1);
        assert_eq!(writer.stats().files_skipped, 1);
        writer.close().unwrap();
    }

    #[test]
    fn test_close_key_releases_handle() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let file = write_file(source.path(), "a.txt", 5, b'a');

        let mut writer = BundleWriter::new(output.path(), 100);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        writer.append_group(&key("txt"), &[file], &style).unwrap();
        assert_eq!(writer.open_count(), 1);

        writer.close_key(&key("txt")).unwrap();
        assert_eq!(writer.open_count(), 0);
        assert_eq!(writer.close().unwrap().len(), 1);
    }

    #[test]
    fn test_append_after_close_key_resumes_last_part() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = write_file(source.path(), "a.txt", 5, b'a');
        let b = write_file(source.path(), "b.txt", 5, b'b');
        let c = write_file(source.path(), "c.txt", 5, b'c');

        let mut writer = BundleWriter::new(output.path(), 10);
        let style = HeaderStyle::Relative {
            base_dir: source.path(),
        };
        writer.append_group(&key("txt"), &[a], &style).unwrap();
        writer.close_key(&key("txt")).unwrap();
        writer.append_group(&key("txt"), &[b], &style).unwrap();
        writer.close_key(&key("txt")).unwrap();
        writer.append_group(&key("txt"), &[c], &style).unwrap();
        let bundles = writer.close().unwrap();

        assert_eq!(bundles.len(), 2);
        let part1 = fs::read_to_string(output.path().join("txt_context_1.txt")).unwrap();
        assert!(part1.contains("aaaaa"));
        assert!(part1.contains("bbbbb"));
        let part2 = fs::read_to_string(output.path().join("txt_context_2.txt")).unwrap();
        assert!(part2.contains("ccccc"));
        assert!(!part2.contains("aaaaa"));
    }

    #[test]
    fn test_drop_flushes_pending_content() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let file = write_file(source.path(), "a.txt", 5, b'a');

        {
            let mut writer = BundleWriter::new(output.path(), 100);
            let style = HeaderStyle::Relative {
                base_dir: source.path(),
            };
            writer.append_group(&key("txt"), &[file], &style).unwrap();
        }

        let content = fs::read_to_string(output.path().join("txt_context_1.txt")).unwrap();
        assert!(content.contains("aaaaa"));
    }
}
