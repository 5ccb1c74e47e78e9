//! Run-level accumulators
//!
//! Each worker returns its shard's vocabulary mentions and year entries;
//! the orchestrator folds them in here in shard order. No ambient
//! mutable state is shared with the workers.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::{Compression, GzBuilder};
use rustc_hash::FxHashMap;

use crate::extract::{ShardOutput, VocabularyEntry};
use crate::transform;

/// Name of the gzipped publication→year index.
pub const YEAR_INDEX_FILE: &str = "pub2year.json.gz";

#[derive(Debug, Default)]
pub struct RunAggregates {
    /// Field id → dictionary entry; later shards overwrite earlier ones.
    pub vocabulary: FxHashMap<String, VocabularyEntry>,
    /// Publication id → year, known years only.
    pub pub2year: FxHashMap<i64, i32>,
}

impl RunAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one shard's output in. Call in shard order; vocabulary
    /// entries are last-write-wins.
    pub fn absorb(&mut self, output: &ShardOutput) {
        for (id, entry) in &output.vocabulary {
            self.vocabulary.insert(id.clone(), entry.clone());
        }
        for (id, year) in &output.year_entries {
            self.pub2year.insert(*id, *year);
        }
    }

    /// Write `fieldinfo.parquet`. Only meaningful on full-rewrite runs,
    /// where every shard contributed to the dictionary.
    pub fn write_vocabulary(&self, output_dir: &Path, zstd_level: i32) -> Result<usize> {
        let batch = transform::fieldinfo_batch(&self.vocabulary)
            .context("failed to build fieldinfo batch")?;

        let mut sink = citebase_core::ParquetSink::global(
            "fieldinfo",
            output_dir,
            &crate::schema::FIELDINFO_SCHEMA,
            zstd_level,
        )
        .context("failed to open fieldinfo sink")?;
        sink.write_batch(&batch)
            .context("failed to write fieldinfo batch")?;
        let rows = sink.finalize().context("failed to finalize fieldinfo")?;
        Ok(rows)
    }

    /// Write `pub2year.json.gz` atomically. Keys sort numerically and the
    /// gzip header carries no timestamp, so reruns are byte-identical.
    pub fn write_year_index(&self, output_dir: &Path) -> Result<()> {
        let sorted: BTreeMap<i64, i32> = self.pub2year.iter().map(|(k, v)| (*k, *v)).collect();
        let json = serde_json::to_vec(&sorted).context("failed to serialize year index")?;

        let final_path = output_dir.join(YEAR_INDEX_FILE);
        let tmp_path = output_dir.join(format!("{YEAR_INDEX_FILE}.tmp"));

        let file = std::fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        let mut encoder = GzBuilder::new().mtime(0).write(file, Compression::default());
        encoder
            .write_all(&json)
            .context("failed to compress year index")?;
        encoder.finish().context("failed to flush year index")?;

        std::fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("failed to commit {}", final_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldType;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn vocab(name: &str, field_type: FieldType) -> VocabularyEntry {
        VocabularyEntry {
            name: name.to_string(),
            field_type,
        }
    }

    #[test]
    fn absorb_last_write_wins() {
        let mut agg = RunAggregates::new();

        let mut first = ShardOutput::default();
        first
            .vocabulary
            .push(("D1".into(), vocab("Old name", FieldType::Mesh)));
        agg.absorb(&first);

        let mut second = ShardOutput::default();
        second
            .vocabulary
            .push(("D1".into(), vocab("New name", FieldType::Mesh)));
        second
            .vocabulary
            .push(("D2".into(), vocab("Other", FieldType::Chemical)));
        agg.absorb(&second);

        assert_eq!(agg.vocabulary.len(), 2);
        assert_eq!(agg.vocabulary["D1"].name, "New name");
    }

    #[test]
    fn absorb_collects_years() {
        let mut agg = RunAggregates::new();
        let mut output = ShardOutput::default();
        output.year_entries.push((100, 1975));
        output.year_entries.push((200, 2001));
        agg.absorb(&output);

        assert_eq!(agg.pub2year[&100], 1975);
        assert_eq!(agg.pub2year[&200], 2001);
    }

    #[test]
    fn year_index_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = RunAggregates::new();
        agg.pub2year.insert(100, 1975);
        agg.pub2year.insert(50, 1960);

        agg.write_year_index(dir.path()).unwrap();

        let file = std::fs::File::open(dir.path().join(YEAR_INDEX_FILE)).unwrap();
        let mut json = String::new();
        GzDecoder::new(file).read_to_string(&mut json).unwrap();

        let parsed: BTreeMap<i64, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[&100], 1975);
        assert_eq!(parsed[&50], 1960);
        // No tmp residue
        assert!(!dir.path().join(format!("{YEAR_INDEX_FILE}.tmp")).exists());
    }

    #[test]
    fn year_index_bytes_deterministic() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        let mut agg = RunAggregates::new();
        for id in 0..100 {
            agg.pub2year.insert(id, 1900 + (id % 100) as i32);
        }
        agg.write_year_index(dir_a.path()).unwrap();
        agg.write_year_index(dir_b.path()).unwrap();

        let a = std::fs::read(dir_a.path().join(YEAR_INDEX_FILE)).unwrap();
        let b = std::fs::read(dir_b.path().join(YEAR_INDEX_FILE)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn vocabulary_parquet_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = RunAggregates::new();
        agg.vocabulary
            .insert("D1".into(), vocab("Animals", FieldType::Mesh));

        let rows = agg.write_vocabulary(dir.path(), 3).unwrap();
        assert_eq!(rows, 1);
        assert!(citebase_core::is_valid_parquet(
            &dir.path().join("fieldinfo.parquet")
        ));
    }
}
