//! citebase-store: Per-shard checkpoint records
//!
//! Blake3-fingerprinted evidence that a shard's outputs were fully
//! written. A checkpoint is created only after every partition of the
//! shard is finalized, so its presence implies a complete output set —
//! the resume decision never has to infer completeness from individual
//! partition files.

pub mod checkpoint;
pub mod hash;

pub use checkpoint::{OutputFile, ShardCheckpoint};
pub use hash::{combine_hashes, hash_bytes, hash_file, short_hash};
