// Reporting sinks for batch progress and categorised per-item failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, error, info, warn};

use super::stats::BatchSummary;
use crate::error::ReportCategory;

pub trait BatchReporter: Send + Sync {
    /// Called once before the first item.
    fn begin(&self, total: usize, timeout: Duration);
    /// Called once per input URL, whatever its outcome.
    fn advance(&self);
    fn report(&self, category: ReportCategory, url: &str, detail: &str);
    fn finish(&self, summary: &BatchSummary);
}

fn log_event(category: ReportCategory, url: &str, detail: &str) {
    match category {
        ReportCategory::Interrupt => warn!(category = %category, "{}", detail),
        _ if detail.is_empty() => error!(category = %category, url, "{}", category),
        _ => error!(category = %category, url, "{}: {}", category, detail),
    }
}

/// Log-only reporter. Progress goes to `debug` instead of a bar.
#[derive(Debug, Default)]
pub struct TracingReporter {
    total: AtomicUsize,
    position: AtomicUsize,
}

impl TracingReporter {
    /// Items advanced past since the last `begin`.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }
}

impl BatchReporter for TracingReporter {
    fn begin(&self, total: usize, timeout: Duration) {
        self.total.store(total, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
        info!(
            "downloading {} files with a {}s timeout",
            total,
            timeout.as_secs()
        );
    }

    fn advance(&self) {
        let done = self.position.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("progress {}/{}", done, self.total.load(Ordering::Relaxed));
    }

    fn report(&self, category: ReportCategory, url: &str, detail: &str) {
        log_event(category, url, detail);
    }

    fn finish(&self, summary: &BatchSummary) {
        info!("batch finished: {}", summary);
    }
}

/// Terminal progress bar plus tracing output.
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchReporter for ConsoleReporter {
    fn begin(&self, total: usize, timeout: Duration) {
        let style = ProgressStyle::with_template(
            "{msg} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_message(format!(
            "downloading files with a {}s timeout",
            timeout.as_secs()
        ));
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn report(&self, category: ReportCategory, url: &str, detail: &str) {
        self.bar.suspend(|| log_event(category, url, detail));
    }

    fn finish(&self, summary: &BatchSummary) {
        self.bar.finish();
        info!("batch finished: {}", summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_reporter_counts_progress() {
        let reporter = TracingReporter::default();
        reporter.begin(3, Duration::from_secs(60));
        reporter.advance();
        reporter.advance();
        assert_eq!(reporter.position(), 2);

        reporter.begin(1, Duration::from_secs(60));
        assert_eq!(reporter.position(), 0);
    }
}
