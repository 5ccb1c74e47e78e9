//! Run configuration

use std::path::PathBuf;

/// Settings for one ingestion run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the baseline XML shards (`*.xml` or `*.xml.gz`).
    pub input_dir: PathBuf,
    /// Directory the parquet tables, indices and checkpoints land in.
    pub output_dir: PathBuf,
    /// Reprocess every shard even when a valid checkpoint exists.
    /// Also forces the vocabulary dictionary to be rewritten.
    pub rewrite_existing: bool,
    /// Show live progress bars (suppressed when stderr is not a TTY).
    pub show_progress: bool,
    /// Zstd compression level for parquet output.
    pub zstd_level: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("RawXML"),
            output_dir: PathBuf::from("corpus"),
            rewrite_existing: false,
            show_progress: true,
            zstd_level: 3,
        }
    }
}

impl Config {
    /// Subdirectory the per-shard checkpoints are kept in.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.output_dir.join("checkpoints")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.rewrite_existing);
        assert_eq!(config.zstd_level, 3);
        assert_eq!(
            config.checkpoint_dir(),
            PathBuf::from("corpus").join("checkpoints")
        );
    }
}
