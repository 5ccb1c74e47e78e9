//! Shard checkpoint records
//!
//! One JSON file per processed shard, written after all of the shard's
//! partition files are finalized. Records which outputs were produced
//! and their content hashes, so a resumed run can tell a complete shard
//! from an interrupted one without guessing from partition existence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hash;

/// One output file produced for a shard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    /// Filename relative to the output directory.
    pub file: String,
    /// Rows written.
    pub rows: usize,
    /// Blake3 content hash (hex).
    pub blake3: String,
}

/// Persisted evidence that one shard was fully processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardCheckpoint {
    /// Positional shard index (lexicographic input order).
    pub shard_index: usize,
    /// Input shard filename this checkpoint covers.
    pub source_file: String,
    /// Record kind → output file. BTreeMap for stable serialization.
    pub outputs: BTreeMap<String, OutputFile>,
    /// Combined fingerprint of all outputs, in kind order.
    pub fingerprint: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ShardCheckpoint {
    /// Hash the finalized output files and assemble the record.
    /// `outputs` is `(kind, path, rows)` per partition.
    pub fn capture(
        shard_index: usize,
        source_file: &str,
        outputs: &[(&str, PathBuf, usize)],
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        let mut hashes = Vec::with_capacity(outputs.len());

        for (kind, path, rows) in outputs {
            let h = hash::hash_file(path)
                .with_context(|| format!("failed to hash {}", path.display()))?;
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("output path has no filename: {}", path.display()))?;
            map.insert(
                (*kind).to_string(),
                OutputFile {
                    file,
                    rows: *rows,
                    blake3: h.to_hex().to_string(),
                },
            );
            hashes.push(h);
        }

        Ok(Self {
            shard_index,
            source_file: source_file.to_string(),
            outputs: map,
            fingerprint: hash::combine_hashes(&hashes).to_hex().to_string(),
            created_at: chrono::Utc::now(),
        })
    }

    /// Checkpoint file path for a shard index: `shard_{idx:04}.json`.
    pub fn path_for(checkpoint_dir: &Path, shard_index: usize) -> PathBuf {
        checkpoint_dir.join(format!("shard_{shard_index:04}.json"))
    }

    /// Write atomically (tmp then rename) under `checkpoint_dir`.
    pub fn write_to(&self, checkpoint_dir: &Path) -> Result<()> {
        let path = Self::path_for(checkpoint_dir, self.shard_index);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("failed to serialize checkpoint")?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to commit {}", path.display()))?;
        Ok(())
    }

    /// Read the checkpoint for a shard index, if any.
    pub fn read_from(checkpoint_dir: &Path, shard_index: usize) -> Result<Self> {
        let path = Self::path_for(checkpoint_dir, shard_index);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Whether every recorded output file still exists under `output_dir`.
    pub fn outputs_present(&self, output_dir: &Path) -> bool {
        self.outputs
            .values()
            .all(|o| output_dir.join(&o.file).exists())
    }

    /// Deep check: re-hash every output and compare to the recorded
    /// hashes. Slower than `outputs_present`; used for audits.
    pub fn verify(&self, output_dir: &Path) -> Result<bool> {
        for out in self.outputs.values() {
            let path = output_dir.join(&out.file);
            if !path.exists() {
                return Ok(false);
            }
            let h = hash::hash_file(&path)
                .with_context(|| format!("failed to hash {}", path.display()))?;
            if h.to_hex().to_string() != out.blake3 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
