use crate::error::{DecompackError, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packs `files` into `<prefix>_<n>.zip` archives of at most `chunk_size`
/// members each, numbered from 1 over the path-sorted list.
///
/// Member names are relative to `base_dir` when given, otherwise the bare
/// file name. Returns the archives written, in order.
pub fn pack(
    files: &[PathBuf],
    output_dir: &Path,
    chunk_size: usize,
    prefix: &str,
    base_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        log::info!("No files to archive for '{}'", prefix);
        return Ok(Vec::new());
    }

    if chunk_size == 0 {
        return Err(DecompackError::Config {
            message: "files per archive must be greater than 0".to_string(),
        });
    }

    let mut sorted = files.to_vec();
    sorted.sort();

    let num_archives = sorted.len().div_ceil(chunk_size);
    log::info!(
        "Packing {} files into {} archive(s) with prefix '{}'",
        sorted.len(),
        num_archives,
        prefix
    );

    let mut archives = Vec::with_capacity(num_archives);
    for (index, chunk) in sorted.chunks(chunk_size).enumerate() {
        let archive_path = output_dir.join(format!("{}_{}.zip", prefix, index + 1));

        write_archive(&archive_path, chunk, base_dir).map_err(|source| {
            DecompackError::ArchiveWrite {
                path: archive_path.display().to_string(),
                source,
            }
        })?;

        log::debug!(
            "Wrote {} ({} members)",
            archive_path.display(),
            chunk.len()
        );
        archives.push(archive_path);
    }

    Ok(archives)
}

fn write_archive(archive_path: &Path, members: &[PathBuf], base_dir: Option<&Path>) -> ZipResult<()> {
    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);

    for member in members {
        let source = File::open(member)?;
        let len = source.metadata()?.len();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(len >= u32::MAX as u64);

        writer.start_file(member_name(member, base_dir), options)?;
        io::copy(&mut BufReader::new(source), &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

/// Archive member name for `path`: forward-slash separated and relative to
/// `base_dir` when `path` lies under it.
pub fn member_name(path: &Path, base_dir: Option<&Path>) -> String {
    let relative = base_dir.and_then(|base| path.strip_prefix(base).ok());

    match relative {
        Some(relative) => relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        None => path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string()),
    }
}
