pub mod classifier;
pub mod tree_scanner;

pub use classifier::{classify, Classification, ClassificationKey, BINARY_EXTENSIONS, NO_EXTENSION};
pub use tree_scanner::{group_by_key, ExtractedTree, GroupedFiles, TreeScanner, TreeStatistics};
