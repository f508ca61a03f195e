pub mod classify;
pub mod engine;
pub mod report;

pub use classify::{classify, PathClassification, VERSIONS_PREFIX};
pub use engine::{Outcome, Reconciler, RecordResult, RetryPolicy, SkipReason};
pub use report::BatchSummary;
