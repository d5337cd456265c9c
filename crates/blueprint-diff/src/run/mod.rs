pub mod orchestrator;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use self::orchestrator::run_comparison;
use crate::diff::{AlignmentOffset, DiffMetrics};

/// Inputs that stay fixed for every page of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRequest {
    pub scale: f64,
    pub offset: AlignmentOffset,
    /// Maximum pages to compare; `None` is unbounded.
    pub page_ceiling: Option<u32>,
}

/// The page ceiling cut the shared page range short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// Pages both documents have.
    pub available: u32,
    /// Pages actually compared.
    pub compared: u32,
}

/// Reported after each page completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: u32,
    pub total: u32,
}

impl PageProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::from(self.page) / f64::from(self.total)
    }
}

/// Cooperative cancellation shared between the caller and a running
/// comparison. Checked before every render call.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A completed comparison. Only [`run_comparison`] builds one, and only
/// after every page succeeded; it is not modified afterwards.
#[derive(Debug)]
pub struct ComparisonRun {
    request: RunRequest,
    truncation: Option<Truncation>,
    results: Vec<DiffMetrics>,
}

impl ComparisonRun {
    pub fn scale(&self) -> f64 {
        self.request.scale
    }

    pub fn offset(&self) -> AlignmentOffset {
        self.request.offset
    }

    pub fn page_ceiling(&self) -> Option<u32> {
        self.request.page_ceiling
    }

    /// Set when the page ceiling reduced the compared range.
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    /// Per-page results, page 1 first.
    pub fn pages(&self) -> &[DiffMetrics] {
        &self.results
    }
}
