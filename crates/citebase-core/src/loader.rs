//! Unified-table loader over shard partitions
//!
//! The read path for downstream consumers: discovers every partition of
//! one record kind, loads them in ascending shard-index order, and
//! concatenates into a single table. Unlike the write path, this
//! materializes the whole table in memory.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;

/// Discover every `{prefix}_NNNN.parquet` partition under `dir`,
/// sorted by shard index.
pub fn partition_paths(dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
    // Escape the directory component so a corpus path containing glob
    // metacharacters ([, ?, *) still matches its own partitions
    let dir_part = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&dir_part).join(format!("{prefix}_*.parquet"));
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .map_err(io::Error::other)?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .collect();

    // Numeric index order; lexicographic fallback keeps unexpected names stable
    paths.sort_by_key(|p| (partition_index(p, prefix), p.clone()));
    Ok(paths)
}

/// Shard index parsed from a partition filename, e.g.
/// `publications_0012.parquet` → 12. Unparseable names sort last.
fn partition_index(path: &Path, prefix: &str) -> usize {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|n| n.strip_prefix('_'))
        .and_then(|n| n.strip_suffix(".parquet"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

/// Load every partition of one record kind as record batches, in
/// ascending shard-index order (intra-shard row order preserved).
pub fn load_partitions(dir: &Path, prefix: &str) -> io::Result<Vec<RecordBatch>> {
    let paths = partition_paths(dir, prefix)?;
    let nested: Vec<Vec<RecordBatch>> = paths
        .par_iter()
        .map(|p| read_partition(p))
        .collect::<io::Result<_>>()?;
    Ok(nested.into_iter().flatten().collect())
}

/// Load and concatenate all partitions of one record kind into a single
/// unified table. Errors if no partition exists.
pub fn load_corpus(dir: &Path, prefix: &str) -> io::Result<RecordBatch> {
    let paths = partition_paths(dir, prefix)?;
    let first = paths.first().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {prefix} partitions under {}", dir.display()),
        )
    })?;

    // Zero-row partitions yield no batches, so take the schema from the
    // file metadata rather than the first batch
    let schema = ParquetRecordBatchReaderBuilder::try_new(File::open(first)?)
        .map_err(io::Error::other)?
        .schema()
        .clone();

    let batches = load_partitions(dir, prefix)?;
    concat_batches(&schema, &batches).map_err(io::Error::other)
}

fn read_partition(path: &Path) -> io::Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(io::Error::other)?
        .build()
        .map_err(io::Error::other)?;
    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(io::Error::other)
}
