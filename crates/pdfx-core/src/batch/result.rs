//! Aggregated outcome of a batch run.

use serde::Serialize;

use crate::models::record::{ExtractionResult, RejectionReason};

/// Per-document results of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    outcomes: Vec<ExtractionResult>,
    cancelled: bool,
    /// Input length, when a cancelled run could tell it.
    input_len: Option<usize>,
    /// Input positions that were never processed.
    skipped: Vec<usize>,
}

/// A rejected document, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub source_id: String,
    pub reason: RejectionReason,
}

/// Counts and rejection list of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Documents in the input; equals `processed` unless a run was cut short.
    pub total: usize,
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub cancelled: bool,
    /// Input positions (0-based) of documents that were never processed.
    pub skipped: Vec<usize>,
    pub rejections: Vec<Rejection>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results of a run over `input_len` items where the `skipped`
    /// positions never started.
    pub(crate) fn from_outcomes(
        outcomes: Vec<ExtractionResult>,
        skipped: Vec<usize>,
        input_len: usize,
    ) -> Self {
        Self {
            outcomes,
            cancelled: !skipped.is_empty(),
            input_len: (!skipped.is_empty()).then_some(input_len),
            skipped,
        }
    }

    /// Append the next document's result.
    pub fn push(&mut self, result: ExtractionResult) {
        self.outcomes.push(result);
    }

    /// Stop the run with `remaining` documents left unprocessed, if known.
    pub(crate) fn mark_cancelled(&mut self, remaining: Option<usize>) {
        self.cancelled = true;
        if let Some(remaining) = remaining {
            let done = self.outcomes.len();
            self.input_len = Some(done + remaining);
            self.skipped = (done..done + remaining).collect();
        }
    }

    /// All results, in input order.
    pub fn outcomes(&self) -> &[ExtractionResult] {
        &self.outcomes
    }

    /// Whether the run stopped before consuming every document.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of input documents, processed or not.
    ///
    /// A lazy source of unknown length that was cancelled reports only the
    /// documents it handed out.
    pub fn input_len(&self) -> usize {
        self.input_len.unwrap_or(self.outcomes.len())
    }

    /// Input positions that were never processed, in ascending order.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|r| r.is_accepted()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.accepted_count()
    }

    /// Accepted records only; these are the rows to export.
    pub fn accepted(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.outcomes.iter().filter(|r| r.is_accepted())
    }

    /// Rejected documents with their reasons.
    pub fn rejections(&self) -> impl Iterator<Item = Rejection> + '_ {
        self.outcomes.iter().filter_map(|r| {
            r.rejection().map(|reason| Rejection {
                source_id: r.source_id.clone(),
                reason: reason.clone(),
            })
        })
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.input_len(),
            processed: self.len(),
            accepted: self.accepted_count(),
            rejected: self.rejected_count(),
            cancelled: self.cancelled,
            skipped: self.skipped.clone(),
            rejections: self.rejections().collect(),
        }
    }
}
