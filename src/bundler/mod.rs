pub mod aggregator;
pub mod bundle_writer;

pub use aggregator::{create_bundles, AggregatorState};
pub use bundle_writer::{read_text_lossy, AppendOutcome, BundleStats, BundleWriter, HeaderStyle};
