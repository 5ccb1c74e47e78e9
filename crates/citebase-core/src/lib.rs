//! Citebase Core - Shared infrastructure for the corpus pipeline
//!
//! Columnar output sinks, the unified-table loader, and the
//! logging/progress plumbing used by the ingestion crates.

pub mod loader;
pub mod logging;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use loader::{load_corpus, load_partitions, partition_paths};
pub use logging::init_logging;
pub use progress::{ProgressContext, fmt_num};
pub use sink::{ParquetSink, cleanup_tmp_files, is_valid_parquet};
