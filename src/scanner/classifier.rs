use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Key used for files that have no extension.
pub const NO_EXTENSION: &str = "no_extension";

/// Extensions whose contents are never concatenated into text bundles.
pub const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".webp", // images
    ".ogg", ".mp3", ".wav", ".flac", // audio
    ".ttf", ".woff", ".woff2", ".eot", // fonts
    ".bin", ".dat", ".class",
];

/// Grouping key derived from a file's extension: `.ext` in lowercase, or
/// [`NO_EXTENSION`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClassificationKey(String);

impl ClassificationKey {
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension {
            Some(ext) if !ext.is_empty() => Self(format!(".{}", ext.to_lowercase())),
            _ => Self(NO_EXTENSION.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key without its leading dot, used to name bundle files.
    pub fn stem(&self) -> &str {
        self.0.strip_prefix('.').unwrap_or(&self.0)
    }

    pub fn is_binary(&self) -> bool {
        BINARY_EXTENSIONS.contains(&self.0.as_str())
    }
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub key: ClassificationKey,
    pub is_binary: bool,
}

pub fn classify(path: &Path) -> Classification {
    let extension = path.extension().map(|e| e.to_string_lossy());
    let key = ClassificationKey::from_extension(extension.as_deref());
    let is_binary = key.is_binary();

    Classification { key, is_binary }
}
