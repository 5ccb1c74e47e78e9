//! Shard discovery and resume planning

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use citebase_core::is_valid_parquet;
use citebase_store::ShardCheckpoint;

/// One input shard scheduled for the run.
#[derive(Debug, Clone)]
pub struct ShardPlan {
    /// Positional index in lexicographic filename order. Partition
    /// files and checkpoints are keyed by this.
    pub index: usize,
    pub path: PathBuf,
    pub filename: String,
}

/// Enumerate the input shards in deterministic order.
///
/// Accepts `*.xml` and `*.xml.gz`; everything else in the directory is
/// ignored. Lexicographic filename order matches the upstream baseline
/// numbering, so indices are stable across runs.
pub fn plan_shards(input_dir: &Path) -> Result<Vec<ShardPlan>> {
    let entries = std::fs::read_dir(input_dir)
        .with_context(|| format!("failed to read input dir {}", input_dir.display()))?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.context("failed to read input dir entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".xml") || name.ends_with(".xml.gz") {
            files.push((name.to_string(), path));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(index, (filename, path))| ShardPlan {
            index,
            path,
            filename,
        })
        .collect())
}

/// Whether a shard can be skipped on this run.
///
/// Requires a checkpoint for the shard's index that names the same
/// source file, with every recorded partition still present and
/// carrying a readable parquet footer. Anything less reprocesses.
pub fn should_skip(
    plan: &ShardPlan,
    checkpoint_dir: &Path,
    output_dir: &Path,
    rewrite_existing: bool,
) -> bool {
    if rewrite_existing {
        return false;
    }

    let checkpoint = match ShardCheckpoint::read_from(checkpoint_dir, plan.index) {
        Ok(c) => c,
        Err(_) => return false,
    };

    if checkpoint.source_file != plan.filename {
        log::debug!(
            "Checkpoint {} covers {}, not {}; reprocessing",
            plan.index,
            checkpoint.source_file,
            plan.filename
        );
        return false;
    }

    if !checkpoint.outputs_present(output_dir) {
        log::debug!("Shard {} has missing partitions; reprocessing", plan.index);
        return false;
    }

    for output in checkpoint.outputs.values() {
        if !is_valid_parquet(&output_dir.join(&output.file)) {
            log::debug!(
                "Partition {} is unreadable; reprocessing shard {}",
                output.file,
                plan.index
            );
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn plans_in_lexicographic_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "pubmed25n0002.xml.gz");
        touch(dir.path(), "pubmed25n0001.xml.gz");
        touch(dir.path(), "pubmed25n0010.xml.gz");
        touch(dir.path(), "README.txt");

        let plans = plan_shards(dir.path()).unwrap();

        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].filename, "pubmed25n0001.xml.gz");
        assert_eq!(plans[0].index, 0);
        assert_eq!(plans[1].filename, "pubmed25n0002.xml.gz");
        assert_eq!(plans[2].filename, "pubmed25n0010.xml.gz");
        assert_eq!(plans[2].index, 2);
    }

    #[test]
    fn accepts_plain_xml() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "shard.xml");
        let plans = plan_shards(dir.path()).unwrap();
        assert_eq!(plans.len(), 1);
    }

    #[test]
    fn empty_dir_plans_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plan_shards(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plan_shards(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn no_checkpoint_means_process() {
        let dir = tempfile::tempdir().unwrap();
        let plan = ShardPlan {
            index: 0,
            path: dir.path().join("a.xml"),
            filename: "a.xml".to_string(),
        };
        assert!(!should_skip(&plan, dir.path(), dir.path(), false));
    }

    #[test]
    fn rewrite_never_skips() {
        let dir = tempfile::tempdir().unwrap();
        let plan = ShardPlan {
            index: 0,
            path: dir.path().join("a.xml"),
            filename: "a.xml".to_string(),
        };
        assert!(!should_skip(&plan, dir.path(), dir.path(), true));
    }
}
