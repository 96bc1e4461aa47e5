// Public entry points: tracing setup and the one-call bulk download.

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod batch;

/// Filter used when `RUST_LOG` is unset. Keeps the HTTP stack's chatter out of the batch log.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber for the batch log. Only the first call in a process has any
/// effect; `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    INIT_TRACING.call_once(|| {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(default_filter),
        };
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_err()
        {
            // Host program already owns the global subscriber.
            return;
        }
        debug!("batch log filter installed (default {})", default_filter);
    });
}
