// Batch orchestration: cache bookkeeping, progress reporting and the per-URL loop.

pub mod cache;
pub mod coordinator;
pub mod report;
pub mod stats;
