//! Batch processing across many documents.

mod coordinator;
mod result;

pub use coordinator::{run, BatchCoordinator, BatchProgress, CancellationToken, ProgressCallback};
pub use result::{BatchResult, BatchSummary, Rejection};
