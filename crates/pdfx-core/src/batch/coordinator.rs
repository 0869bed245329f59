//! Batch coordinator: runs the record builder over a document sequence.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::result::BatchResult;
use crate::extract::RecordBuilder;
use crate::models::document::DocumentText;
use crate::models::record::ExtractionResult;
use crate::rules::RuleSet;

/// Cooperative cancellation flag shared between a batch and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the batch to stop starting new documents.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Progress report emitted after each finished document.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    /// Documents finished so far, including this one.
    pub completed: usize,
    /// Total number of documents, when the source knows it.
    pub total: Option<usize>,
    /// The document that just finished.
    pub source_id: &'a str,
    /// Whether it was accepted.
    pub accepted: bool,
}

/// Callback invoked with batch progress.
pub type ProgressCallback = Box<dyn Fn(&BatchProgress<'_>) + Send + Sync>;

/// Applies a rule set to many documents.
///
/// No document can abort the batch: extraction errors and missing required
/// fields are recorded as rejections. Results are always in input order.
pub struct BatchCoordinator<'r> {
    rules: &'r RuleSet,
    jobs: usize,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<'r> BatchCoordinator<'r> {
    /// Create a sequential coordinator.
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            jobs: 1,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Set the number of parallel workers used by [`run_parallel`](Self::run_parallel).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress after each document.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchProgress<'_>) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Consume `sources` in order, one document at a time.
    ///
    /// The sequence is pulled lazily. After cancellation a source that knows
    /// its length is never pulled again; one that does not is pulled once to
    /// tell whether anything was left. A run that had already consumed every
    /// document is not reported as cancelled.
    pub fn run<I>(&self, sources: I) -> BatchResult
    where
        I: IntoIterator<Item = DocumentText>,
    {
        let start = Instant::now();
        let builder = RecordBuilder::new(self.rules);
        let mut batch = BatchResult::new();
        let mut sources = sources.into_iter();
        let total = match sources.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        };

        loop {
            if self.cancel.is_cancelled() {
                let left = match sources.size_hint() {
                    (_, Some(0)) => false,
                    (lower, Some(upper)) if lower == upper => {
                        batch.mark_cancelled(Some(upper));
                        true
                    }
                    _ => {
                        let left = sources.next().is_some();
                        if left {
                            batch.mark_cancelled(None);
                        }
                        left
                    }
                };
                if left {
                    warn!("Batch cancelled after {} documents", batch.len());
                }
                break;
            }
            let Some(document) = sources.next() else {
                break;
            };

            let result = self.process(&builder, document);
            self.report(batch.len() + 1, total, &result);
            batch.push(result);
        }

        info!(
            "Processed {} documents in {:?}: {} accepted, {} rejected",
            batch.len(),
            start.elapsed(),
            batch.accepted_count(),
            batch.rejected_count()
        );
        batch
    }

    /// Load and process `items` on a bounded worker pool.
    ///
    /// `load` turns each item into its document text on the worker thread,
    /// so text extraction runs in parallel too. Results are reordered into
    /// input order once all workers finish. With a single job this is the
    /// same as [`run`](Self::run).
    pub fn run_parallel<T, F>(&self, items: &[T], load: F) -> BatchResult
    where
        T: Sync,
        F: Fn(&T) -> DocumentText + Sync,
    {
        if self.jobs <= 1 {
            return self.run(items.iter().map(&load));
        }

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to start {} workers ({}), running sequentially", self.jobs, e);
                return self.run(items.iter().map(&load));
            }
        };

        let start = Instant::now();
        let builder = RecordBuilder::new(self.rules);
        let completed = AtomicUsize::new(0);

        debug!("Processing {} documents with {} workers", items.len(), self.jobs);

        let mut indexed: Vec<(usize, Option<ExtractionResult>)> = pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if self.cancel.is_cancelled() {
                        return (index, None);
                    }
                    let result = self.process(&builder, load(item));
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report(done, Some(items.len()), &result);
                    (index, Some(result))
                })
                .collect()
        });

        // Sort by original index to keep input order
        indexed.sort_by_key(|(index, _)| *index);

        let total = indexed.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for (index, result) in indexed {
            match result {
                Some(result) => outcomes.push(result),
                None => skipped.push(index),
            }
        }
        if !skipped.is_empty() {
            warn!(
                "Batch cancelled: {} of {} documents processed",
                outcomes.len(),
                total
            );
        }

        let batch = BatchResult::from_outcomes(outcomes, skipped, total);
        info!(
            "Processed {} documents in {:?} with {} workers: {} accepted, {} rejected",
            batch.len(),
            start.elapsed(),
            self.jobs,
            batch.accepted_count(),
            batch.rejected_count()
        );
        batch
    }

    fn process(&self, builder: &RecordBuilder<'_>, document: DocumentText) -> ExtractionResult {
        match document.text {
            Ok(text) => builder.build(document.source_id, &text),
            Err(message) => {
                warn!("Skipping {}: {}", document.source_id, message);
                builder.extraction_failed(document.source_id, message)
            }
        }
    }

    fn report(&self, completed: usize, total: Option<usize>, result: &ExtractionResult) {
        if let Some(ref callback) = self.progress {
            callback(&BatchProgress {
                completed,
                total,
                source_id: &result.source_id,
                accepted: result.is_accepted(),
            });
        }
    }
}

/// Run `rules` over `sources` sequentially.
pub fn run<I>(sources: I, rules: &RuleSet) -> BatchResult
where
    I: IntoIterator<Item = DocumentText>,
{
    BatchCoordinator::new(rules).run(sources)
}
