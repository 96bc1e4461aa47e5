// Per-batch outcome counters.

use std::fmt;
use std::time::Duration;

/// How one input URL was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemResult {
    Saved,
    Unavailable,
    /// Already in the cache; not fetched.
    Cached,
    BadId,
    /// Network or unexpected failure; left out of the cache.
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub saved: usize,
    pub unavailable: usize,
    pub cached: usize,
    pub bad_id: usize,
    pub failed: usize,
    /// Set when the operator stopped the batch before the end of the queue.
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: ItemResult) {
        match result {
            ItemResult::Saved => self.saved += 1,
            ItemResult::Unavailable => self.unavailable += 1,
            ItemResult::Cached => self.cached += 1,
            ItemResult::BadId => self.bad_id += 1,
            ItemResult::Failed => self.failed += 1,
        }
    }

    /// Number of input URLs resolved one way or another.
    pub fn processed(&self) -> usize {
        self.saved + self.unavailable + self.cached + self.bad_id + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed in {:.1}s: saved={} unavailable={} cached={} bad_id={} failed={}{}",
            self.processed(),
            self.total,
            self.elapsed.as_secs_f64(),
            self.saved,
            self.unavailable,
            self.cached,
            self.bad_id,
            self.failed,
            if self.interrupted { " (interrupted)" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new(6);
        summary.record(ItemResult::Saved);
        summary.record(ItemResult::Saved);
        summary.record(ItemResult::Unavailable);
        summary.record(ItemResult::Cached);
        summary.record(ItemResult::Failed);

        assert_eq!(summary.processed(), 5);
        assert_eq!(summary.saved, 2);
        assert!(summary.to_string().starts_with("5/6 processed"));
    }
}
