//! Progress reporting for the shard loop
//!
//! Live bars when progress is requested and stderr is a TTY; hidden
//! no-op bars otherwise, so callers never branch.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Central handle for run-level and per-shard progress display.
pub struct ProgressContext {
    multi: MultiProgress,
    enabled: bool,
}

impl ProgressContext {
    /// `show_progress` is the caller's visibility toggle; bars are also
    /// suppressed when stderr is not a terminal.
    pub fn new(show_progress: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            enabled: show_progress && std::io::stderr().is_terminal(),
        }
    }

    /// Run-level bar counting shards.
    pub fn run_bar(&self, total_shards: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(total_shards));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:<8.cyan.bold} {bar:30.green/dim} {pos}/{len} shards {wide_msg:.dim}")
                .expect("invalid template"),
        );
        pb.set_prefix("ingest");
        pb
    }

    /// Spinner line for the shard currently being processed.
    pub fn shard_line(&self, filename: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:<24.dim} {wide_msg}")
                .expect("invalid template"),
        );
        pb.set_prefix(truncate_chars(filename, 24).to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Print above managed bars without tearing them.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.enabled {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `MultiProgress` handle for the log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Truncate to at most `max` characters, never mid-codepoint.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Format a count with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}
