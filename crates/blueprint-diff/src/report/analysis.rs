use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::diff::DiffMetrics;
use crate::run::ComparisonRun;

/// Pages at or under this share of changed pixels are treated as
/// rendering noise rather than a revision.
pub const SEVERITY_BOUNDARY_PERCENT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Identical,
    Negligible,
    Significant,
}

impl Severity {
    pub fn from_percent(diff_percent: f64) -> Self {
        if diff_percent <= 0.0 {
            Self::Identical
        } else if diff_percent <= SEVERITY_BOUNDARY_PERCENT {
            Self::Negligible
        } else {
            Self::Significant
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::Negligible => "negligible",
            Self::Significant => "significant",
        }
    }
}

/// Coarse reading of what kind of revision a page went through, based only
/// on the balance of added and removed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Insight {
    NoChange,
    RemovedDetail,
    NewAnnotations,
    Reworked,
}

impl Insight {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoChange => "No structural change detected.",
            Self::RemovedDetail => {
                "More removals than additions: detail was taken out of the drawing."
            }
            Self::NewAnnotations => {
                "More additions than removals: new annotations or structure were drawn."
            }
            Self::Reworked => "Additions and removals balance out: elements were moved or redrawn.",
        }
    }
}

/// Run-level totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pages_compared: u32,
    pub pages_with_difference: u32,
    pub diff_pixels: u64,
    pub additions: u64,
    pub deletions: u64,
}

pub fn summary(run: &ComparisonRun) -> RunSummary {
    summarize(run.pages())
}

pub fn summarize(pages: &[DiffMetrics]) -> RunSummary {
    pages.iter().fold(RunSummary::default(), |mut acc, m| {
        acc.pages_compared += 1;
        if m.has_difference {
            acc.pages_with_difference += 1;
        }
        acc.diff_pixels += m.diff_pixel_count;
        acc.additions += m.addition_count;
        acc.deletions += m.deletion_count;
        acc
    })
}

pub fn classify(page: &DiffMetrics) -> Severity {
    Severity::from_percent(page.diff_percent)
}

pub fn insight(page: &DiffMetrics) -> Insight {
    insight_from_counts(page.addition_count, page.deletion_count)
}

pub(crate) fn insight_from_counts(additions: u64, deletions: u64) -> Insight {
    match additions.cmp(&deletions) {
        Ordering::Less => Insight::RemovedDetail,
        Ordering::Greater => Insight::NewAnnotations,
        Ordering::Equal if additions == 0 => Insight::NoChange,
        Ordering::Equal => Insight::Reworked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::PixelBuffer;

    fn metrics(page: u32, additions: u64, deletions: u64, percent: f64, flagged: bool) -> DiffMetrics {
        DiffMetrics {
            page_number: page,
            width: 100,
            height: 100,
            diff_pixel_count: additions + deletions,
            addition_count: additions,
            deletion_count: deletions,
            diff_percent: percent,
            has_difference: flagged,
            visualization: PixelBuffer::new(1, 1),
        }
    }

    #[test]
    fn severity_boundary_is_inclusive() {
        assert_eq!(Severity::from_percent(0.0), Severity::Identical);
        assert_eq!(Severity::from_percent(0.01), Severity::Negligible);
        assert_eq!(Severity::from_percent(0.05), Severity::Negligible);
        assert_eq!(Severity::from_percent(0.0501), Severity::Significant);
        assert_eq!(Severity::from_percent(12.5), Severity::Significant);
    }

    #[test]
    fn classify_reads_diff_percent() {
        assert_eq!(classify(&metrics(1, 0, 0, 0.0, false)), Severity::Identical);
        assert_eq!(classify(&metrics(1, 5, 0, 0.05, false)), Severity::Negligible);
        assert_eq!(classify(&metrics(1, 900, 0, 9.0, true)), Severity::Significant);
    }

    #[test]
    fn insight_follows_addition_deletion_balance() {
        assert_eq!(insight(&metrics(1, 0, 0, 0.0, false)), Insight::NoChange);
        assert_eq!(insight(&metrics(1, 10, 400, 4.1, true)), Insight::RemovedDetail);
        assert_eq!(insight(&metrics(1, 400, 10, 4.1, true)), Insight::NewAnnotations);
        assert_eq!(insight(&metrics(1, 200, 200, 4.0, true)), Insight::Reworked);
    }

    #[test]
    fn summary_counts_flagged_pages_and_totals() {
        let pages = vec![
            metrics(1, 0, 0, 0.0, false),
            metrics(2, 3, 2, 0.05, false),
            metrics(3, 500, 100, 6.0, true),
            metrics(4, 0, 320, 3.2, true),
        ];
        let s = summarize(&pages);
        assert_eq!(s.pages_compared, 4);
        assert_eq!(s.pages_with_difference, 2);
        assert_eq!(s.additions, 503);
        assert_eq!(s.deletions, 422);
        assert_eq!(s.diff_pixels, 925);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(summarize(&[]), RunSummary::default());
    }
}
