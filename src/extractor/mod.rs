pub mod decompiler;
pub mod output_area;
pub mod unzip;

pub use decompiler::{locate_decompiler, JavaDecompiler};
pub use output_area::{sanitize_name, write_report, OutputArea, METADATA_DIR};
pub use unzip::UnzipExtractor;

use crate::error::Result;
use std::path::Path;

/// Populates a scratch directory with the contents of one input archive.
///
/// `Err` means the input could not be extracted; the caller records it and
/// moves on to the next input.
pub trait Extractor {
    fn extract(&self, input: &Path, scratch: &Path) -> Result<()>;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Extractor for F
where
    F: Fn(&Path, &Path) -> Result<()>,
{
    fn extract(&self, input: &Path, scratch: &Path) -> Result<()> {
        self(input, scratch)
    }
}
