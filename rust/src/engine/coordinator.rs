// Batch coordinator: walks the URL queue and fetches every record not yet in the cache.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cache::RecordCache;
use super::report::BatchReporter;
use super::stats::{BatchSummary, ItemResult};
use crate::error::{FetchError, ReportCategory};
use crate::model::{FetchOutcome, RecordId, RetrievalTarget};
use crate::source::traits::DocumentSource;

pub struct BatchCoordinator {
    source: Arc<dyn DocumentSource>,
    reporter: Arc<dyn BatchReporter>,
    shutdown: CancellationToken,
}

impl BatchCoordinator {
    pub fn new(source: Arc<dyn DocumentSource>, reporter: Arc<dyn BatchReporter>) -> Self {
        Self {
            source,
            reporter,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned token to stop the batch (e.g. wired to Ctrl-C).
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Process `urls` in order. Never fails: per-item problems are reported and skipped,
    /// and an interrupt ends the batch early with everything committed so far kept.
    ///
    /// The shutdown token is only checked between items.
    pub async fn run(
        &self,
        urls: &[String],
        output_dir: &Path,
        cache: &mut dyn RecordCache,
        timeout: Duration,
    ) -> BatchSummary {
        let started = Instant::now();
        let mut summary = BatchSummary::new(urls.len());
        self.reporter.begin(urls.len(), timeout);

        for url in urls {
            if self.shutdown.is_cancelled() {
                self.stop(&mut summary);
                break;
            }
            match self.process_one(url, output_dir, cache, timeout).await {
                Some(result) => {
                    summary.record(result);
                    self.reporter.advance();
                }
                None => {
                    self.stop(&mut summary);
                    break;
                }
            }
        }

        summary.elapsed = started.elapsed();
        self.reporter.finish(&summary);
        summary
    }

    /// `None` means the operator interrupted this item.
    async fn process_one(
        &self,
        url: &str,
        output_dir: &Path,
        cache: &mut dyn RecordCache,
        timeout: Duration,
    ) -> Option<ItemResult> {
        let Some(id) = RecordId::from_url(url) else {
            self.reporter
                .report(ReportCategory::BadId, url, "could not extract record id");
            return Some(ItemResult::BadId);
        };

        if cache.contains(&id) {
            debug!("record {} already processed, skipping", id);
            return Some(ItemResult::Cached);
        }

        let target = RetrievalTarget::new(id.clone(), url);
        match self.source.fetch(&target, output_dir, timeout).await {
            Ok(outcome) => {
                let result = match &outcome {
                    FetchOutcome::Saved(_) => ItemResult::Saved,
                    FetchOutcome::Unavailable => {
                        info!("record {} has no document available", id);
                        ItemResult::Unavailable
                    }
                };
                if let Err(e) = cache.set(id, outcome.cache_value()) {
                    self.reporter.report(
                        ReportCategory::UnknownError,
                        url,
                        &format!("cache write failed: {:#}", e),
                    );
                    return Some(ItemResult::Failed);
                }
                Some(result)
            }
            Err(FetchError::Interrupted) => None,
            Err(e) => {
                self.reporter.report(e.category(), url, &e.to_string());
                Some(ItemResult::Failed)
            }
        }
    }

    fn stop(&self, summary: &mut BatchSummary) {
        summary.interrupted = true;
        self.reporter.report(
            ReportCategory::Interrupt,
            "",
            "interrupted by operator, stopping batch",
        );
    }
}
