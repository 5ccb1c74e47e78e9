//! Citebase Medline - baseline corpus ingestion
//!
//! Converts a directory of compressed Medline baseline XML shards into
//! partitioned parquet tables (publications, authorships, citations,
//! field tags) plus two global indices: the controlled-vocabulary
//! dictionary and a publication→year lookup.
//!
//! # Features
//!
//! - Tolerant streaming XML extraction with quick-xml
//! - Per-shard checkpoints: resumable and idempotent reruns
//! - Memory bounded by one shard regardless of corpus size
//!
//! # Example
//!
//! ```ignore
//! use citebase_medline::{Config, run};
//!
//! let config = Config {
//!     input_dir: "RawXML".into(),
//!     output_dir: "corpus".into(),
//!     ..Default::default()
//! };
//!
//! let summary = run(&config)?;
//! println!("Ingested {} publications", summary.total_publications);
//! ```

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod parser;
pub mod planner;
pub mod runner;
pub mod schema;
pub mod transform;
pub mod worker;

// Re-exports
pub use config::Config;
pub use runner::{Summary, run};
pub use schema::RecordKind;
