//! Logging setup with indicatif integration

use indicatif::MultiProgress;

fn level_label(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

fn level_color(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    }
}

/// Logger that routes lines through a `MultiProgress` so they print
/// above live progress bars instead of tearing them.
struct ProgressLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl log::Log for ProgressLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            let level = record.level();
            let line = format!(
                "[{}{}\x1b[0m] {}",
                level_color(level),
                level_label(level),
                record.args()
            );
            self.multi.suspend(|| eprintln!("{line}"));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize the `log` facade.
///
/// With a `MultiProgress` the bar-aware logger is installed (TTY runs);
/// without one, plain `env_logger` output with no ANSI colors.
/// Repeated calls are no-ops so tests can initialize freely.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let env = env_logger::Env::default().default_filter_or(default_level);

    if let Some(multi) = multi {
        let inner = env_logger::Builder::from_env(env).build();
        let max_level = inner.filter();
        let installed = log::set_boxed_logger(Box::new(ProgressLogger {
            inner,
            multi: multi.clone(),
        }));
        if installed.is_ok() {
            log::set_max_level(max_level);
        }
    } else {
        let _ = env_logger::Builder::from_env(env)
            .format(|buf, record| {
                writeln!(buf, "[{}] {}", level_label(record.level()), record.args())
            })
            .try_init();
    }
}
