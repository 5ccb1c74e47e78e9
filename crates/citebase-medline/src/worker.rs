//! Per-shard worker: read, parse, extract, write, checkpoint
//!
//! A shard either completes fully (all four partitions finalized, then
//! the checkpoint committed) or leaves no checkpoint, so the planner
//! will retry it on the next run. Partition files themselves are
//! tmp→rename atomic, so a crash mid-shard leaves no torn parquet.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use citebase_core::ParquetSink;
use citebase_store::ShardCheckpoint;
use flate2::read::GzDecoder;

use crate::config::Config;
use crate::extract::{self, ShardOutput};
use crate::parser;
use crate::planner::ShardPlan;
use crate::schema::RecordKind;
use crate::transform;

/// Process one shard end to end. Returns the extracted output so the
/// orchestrator can fold vocabulary and year entries into the run
/// aggregates.
pub fn process_shard(plan: &ShardPlan, config: &Config) -> Result<ShardOutput> {
    let xml = read_shard(plan)?;

    let entries = parser::parse_shard_xml(&xml)
        .with_context(|| format!("unparseable shard {}", plan.filename))?;
    let entry_count = entries.len();

    let output = extract::extract_records(entries);
    if output.dropped_entries > 0 {
        log::warn!(
            "{}: dropped {} of {} entries without a publication id",
            plan.filename,
            output.dropped_entries,
            entry_count
        );
    }

    // Every kind gets a partition, even when empty, so the checkpoint
    // always covers the same four files
    let mut finalized: Vec<(&'static str, PathBuf, usize)> = Vec::with_capacity(4);
    for kind in RecordKind::ALL {
        let batch = transform::batch_for(kind, &output)
            .with_context(|| format!("failed to build {kind} batch for {}", plan.filename))?;

        let mut sink = ParquetSink::partition(
            kind.prefix(),
            plan.index,
            &config.output_dir,
            &kind.schema(),
            config.zstd_level,
        )
        .with_context(|| format!("failed to open {kind} sink for shard {}", plan.index))?;
        sink.write_batch(&batch)
            .with_context(|| format!("failed to write {kind} partition {}", plan.index))?;
        let path = sink.final_path().to_path_buf();
        let rows = sink
            .finalize()
            .with_context(|| format!("failed to finalize {kind} partition {}", plan.index))?;

        finalized.push((kind.prefix(), path, rows));
    }

    // Checkpoint only after every partition is in place
    let checkpoint = ShardCheckpoint::capture(plan.index, &plan.filename, &finalized)?;
    checkpoint
        .write_to(&config.checkpoint_dir())
        .with_context(|| format!("failed to checkpoint shard {}", plan.index))?;

    Ok(output)
}

fn read_shard(plan: &ShardPlan) -> Result<String> {
    let file = std::fs::File::open(&plan.path)
        .with_context(|| format!("failed to open {}", plan.path.display()))?;

    let mut xml = String::new();
    if plan.filename.ends_with(".gz") {
        GzDecoder::new(file)
            .read_to_string(&mut xml)
            .with_context(|| format!("failed to decompress {}", plan.filename))?;
    } else {
        std::io::BufReader::new(file)
            .read_to_string(&mut xml)
            .with_context(|| format!("failed to read {}", plan.filename))?;
    }
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const SHARD_XML: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>100</PMID>
      <Article>
        <ArticleTitle>Example</ArticleTitle>
        <AuthorList>
          <Author>
            <LastName>Doe</LastName>
            <ForeName>Jane</ForeName>
          </Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    fn write_gz_shard(dir: &std::path::Path, name: &str, xml: &str) -> ShardPlan {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(xml.as_bytes()).unwrap();
        enc.finish().unwrap();
        ShardPlan {
            index: 0,
            path,
            filename: name.to_string(),
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let config = Config {
            input_dir: dir.join("in"),
            output_dir: dir.join("out"),
            rewrite_existing: false,
            show_progress: false,
            zstd_level: 3,
        };
        std::fs::create_dir_all(&config.input_dir).unwrap();
        std::fs::create_dir_all(&config.output_dir).unwrap();
        std::fs::create_dir_all(config.checkpoint_dir()).unwrap();
        config
    }

    #[test]
    fn processes_gz_shard_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = write_gz_shard(&config.input_dir, "shard.xml.gz", SHARD_XML);

        let output = process_shard(&plan, &config).unwrap();

        assert_eq!(output.publications.len(), 1);
        assert_eq!(output.authorships.len(), 1);

        // All four partitions exist, including empty ones
        for kind in RecordKind::ALL {
            let path = config
                .output_dir
                .join(format!("{}_0000.parquet", kind.prefix()));
            assert!(citebase_core::is_valid_parquet(&path), "{kind} missing");
        }

        let ckpt = ShardCheckpoint::read_from(&config.checkpoint_dir(), 0).unwrap();
        assert_eq!(ckpt.source_file, "shard.xml.gz");
        assert_eq!(ckpt.outputs.len(), 4);
        assert_eq!(ckpt.outputs["publications"].rows, 1);
        assert_eq!(ckpt.outputs["citations"].rows, 0);
        assert!(ckpt.verify(&config.output_dir).unwrap());
    }

    #[test]
    fn plain_xml_shard_also_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let path = config.input_dir.join("shard.xml");
        std::fs::write(&path, SHARD_XML).unwrap();
        let plan = ShardPlan {
            index: 0,
            path,
            filename: "shard.xml".to_string(),
        };

        let output = process_shard(&plan, &config).unwrap();
        assert_eq!(output.publications.len(), 1);
    }

    #[test]
    fn corrupt_gz_fails_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let path = config.input_dir.join("bad.xml.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();
        let plan = ShardPlan {
            index: 0,
            path,
            filename: "bad.xml.gz".to_string(),
        };

        assert!(process_shard(&plan, &config).is_err());
        assert!(ShardCheckpoint::read_from(&config.checkpoint_dir(), 0).is_err());
    }
}
