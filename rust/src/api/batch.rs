use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::engine::cache::{JsonFileCache, RecordCache};
use crate::engine::coordinator::BatchCoordinator;
use crate::engine::report::ConsoleReporter;
use crate::engine::stats::BatchSummary;
use crate::source::portal::PortalFetcher;

/// Download every record in `urls` with the portal fetcher, a JSON cache at
/// `config.cache_path` and a terminal progress bar.
///
/// `shutdown` stops the batch between items. The caller owns it, and decides whether to wire
/// it to Ctrl-C with [`spawn_interrupt_listener`]. Only a cache that cannot be opened is an
/// error; per-item failures end up in the summary.
pub async fn download_all(
    urls: &[String],
    config: &FetchConfig,
    shutdown: CancellationToken,
) -> Result<BatchSummary> {
    let mut cache = JsonFileCache::open(&config.cache_path)?;
    info!(
        "cache {} holds {} processed records",
        cache.path().display(),
        cache.len()
    );

    let coordinator = BatchCoordinator::new(
        Arc::new(PortalFetcher::from_config(config)),
        Arc::new(ConsoleReporter::new()),
    )
    .with_shutdown(shutdown);

    let summary = coordinator
        .run(
            urls,
            &config.output_dir,
            &mut cache,
            config.download_timeout(),
        )
        .await;
    Ok(summary)
}

/// Cancel `token` on the first Ctrl-C. The task ends on that signal or as soon as `token`
/// is cancelled some other way.
///
/// Once the task has polled `ctrl_c`, tokio keeps its SIGINT handler for the rest of the
/// process, so Ctrl-C no longer terminates the program by default. Call this once, from a
/// binary that owns its signal handling.
pub fn spawn_interrupt_listener(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                match res {
                    Ok(()) => {
                        warn!("interrupt received, finishing current item");
                        token.cancel();
                    }
                    Err(e) => warn!("cannot listen for ctrl-c: {}", e),
                }
            }
            _ = token.cancelled() => {}
        }
    })
}
