//! Run orchestrator
//!
//! Sequential shard loop: plan, skip completed shards, process the
//! rest, fold per-shard output into the run aggregates, then write the
//! global indices. A failing shard is isolated and retried on the next
//! run; it never aborts the loop.

use anyhow::{Context, Result};
use citebase_core::{ProgressContext, cleanup_tmp_files, fmt_num};

use crate::aggregate::RunAggregates;
use crate::config::Config;
use crate::planner;
use crate::worker;

/// Counters for one completed run.
#[derive(Debug, Default, Clone)]
pub struct Summary {
    pub shards_total: usize,
    pub shards_processed: usize,
    pub shards_skipped: usize,
    pub shards_failed: usize,
    pub total_publications: usize,
    pub total_authorships: usize,
    pub total_citations: usize,
    pub total_field_tags: usize,
    pub dropped_entries: usize,
}

/// Ingest every shard under `config.input_dir` into `config.output_dir`.
pub fn run(config: &Config) -> Result<Summary> {
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;
    std::fs::create_dir_all(config.checkpoint_dir())
        .with_context(|| format!("failed to create {}", config.checkpoint_dir().display()))?;
    cleanup_tmp_files(&config.output_dir).context("failed to clean stale tmp files")?;

    let plans = planner::plan_shards(&config.input_dir)?;
    let mut summary = Summary {
        shards_total: plans.len(),
        ..Default::default()
    };

    if plans.is_empty() {
        log::warn!("No XML shards found in {}", config.input_dir.display());
        return Ok(summary);
    }

    log::info!(
        "Ingesting {} shards from {}",
        plans.len(),
        config.input_dir.display()
    );

    let progress = ProgressContext::new(config.show_progress);
    let run_bar = progress.run_bar(plans.len() as u64);
    let mut aggregates = RunAggregates::new();

    for plan in &plans {
        if planner::should_skip(
            plan,
            &config.checkpoint_dir(),
            &config.output_dir,
            config.rewrite_existing,
        ) {
            log::debug!("Skipping completed shard {}", plan.filename);
            summary.shards_skipped += 1;
            run_bar.inc(1);
            continue;
        }

        let line = progress.shard_line(&plan.filename);
        match worker::process_shard(plan, config) {
            Ok(output) => {
                aggregates.absorb(&output);
                summary.shards_processed += 1;
                summary.total_publications += output.publications.len();
                summary.total_authorships += output.authorships.len();
                summary.total_citations += output.citations.len();
                summary.total_field_tags += output.field_tags.len();
                summary.dropped_entries += output.dropped_entries;
                line.finish_and_clear();
            }
            Err(e) => {
                line.finish_and_clear();
                log::error!("Shard {} failed: {e:#}", plan.filename);
                summary.shards_failed += 1;
            }
        }
        run_bar.inc(1);
    }
    run_bar.finish_and_clear();

    // The dictionary is only complete when every shard contributed;
    // partial runs would silently shrink it
    if config.rewrite_existing {
        let rows = aggregates.write_vocabulary(&config.output_dir, config.zstd_level)?;
        log::info!("Wrote fieldinfo.parquet ({} terms)", fmt_num(rows));
    }

    aggregates.write_year_index(&config.output_dir)?;

    log::info!(
        "Run complete: {} processed, {} skipped, {} failed; {} publications, {} citations",
        summary.shards_processed,
        summary.shards_skipped,
        summary.shards_failed,
        fmt_num(summary.total_publications),
        fmt_num(summary.total_citations),
    );
    if summary.shards_failed > 0 {
        log::warn!(
            "{} shards failed and will be retried on the next run",
            summary.shards_failed
        );
    }

    Ok(summary)
}
