//! Parquet output sink with atomic tmp→rename

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Rows per parquet row group.
const ROW_GROUP_SIZE: usize = 1024 * 1024;

/// Buffered zstd parquet writer.
///
/// Writes to `<name>.tmp` and renames to the final path on
/// [`finalize`](ParquetSink::finalize), so a partition file is either
/// complete or absent.
pub struct ParquetSink {
    writer: ArrowWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl ParquetSink {
    /// Sink for one shard-indexed partition: `{kind}_{shard_idx:04}.parquet`.
    pub fn partition(
        kind: &str,
        shard_idx: usize,
        output_dir: &Path,
        schema: &Schema,
        zstd_level: i32,
    ) -> Result<Self, std::io::Error> {
        Self::create(
            output_dir,
            &format!("{kind}_{shard_idx:04}.parquet"),
            schema,
            zstd_level,
        )
    }

    /// Sink for a single global table (no shard index), e.g. the
    /// vocabulary dictionary.
    pub fn global(
        name: &str,
        output_dir: &Path,
        schema: &Schema,
        zstd_level: i32,
    ) -> Result<Self, std::io::Error> {
        Self::create(output_dir, &format!("{name}.parquet"), schema, zstd_level)
    }

    fn create(
        output_dir: &Path,
        filename: &str,
        schema: &Schema,
        zstd_level: i32,
    ) -> Result<Self, std::io::Error> {
        let final_path = output_dir.join(filename);
        let tmp_path = output_dir.join(format!("{filename}.tmp"));

        // Clean up a tmp file left over from an interrupted run
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .set_max_row_group_size(ROW_GROUP_SIZE)
            .build();

        let writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))
            .map_err(std::io::Error::other)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), std::io::Error> {
        self.row_count += batch.num_rows();
        self.writer.write(batch).map_err(std::io::Error::other)
    }

    /// Flush the footer and atomically rename tmp → final.
    pub fn finalize(self) -> Result<usize, std::io::Error> {
        let row_count = self.row_count;
        self.writer.close().map_err(std::io::Error::other)?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(row_count)
    }

    /// Path the partition will land at after `finalize`.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }
}

/// Check that a parquet file exists and has a readable footer.
pub fn is_valid_parquet(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    parquet::file::reader::SerializedFileReader::new(file).is_ok()
}

/// Remove `*.tmp` leftovers from interrupted runs.
pub fn cleanup_tmp_files(output_dir: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
