use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{FetchOutcome, RetrievalTarget};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Retrieve the document for `target` into `output_dir`.
    ///
    /// Retries are handled inside; an `Err` is the last failure once they are exhausted.
    async fn fetch(
        &self,
        target: &RetrievalTarget,
        output_dir: &Path,
        download_timeout: Duration,
    ) -> Result<FetchOutcome, FetchError>;
}
