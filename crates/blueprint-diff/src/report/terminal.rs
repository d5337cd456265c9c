use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::config::Tier;
use crate::diff::DiffMetrics;
use crate::error::CompareError;
use crate::report::analysis::{self, RunSummary, Severity};
use crate::run::{PageProgress, Truncation};

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a single page result line.
pub fn print_page_line(m: &DiffMetrics, elapsed: Duration) {
    clear_line();
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));
    let page = format!("page {:>3}", m.page_number);

    match analysis::classify(m) {
        Severity::Identical => {
            println!("  \x1b[32mSAME\x1b[0m  {page}{time_suffix}");
        }
        _ if !m.has_difference => {
            println!(
                "  \x1b[2mNOISE\x1b[0m {page}  ({} px, {:.2}%){time_suffix}",
                m.diff_pixel_count, m.diff_percent
            );
        }
        _ => {
            println!(
                "  \x1b[31mDIFF\x1b[0m  {page}  (\x1b[34m+{}\x1b[0m / \x1b[31m-{}\x1b[0m px, {:.2}%)  {}{time_suffix}",
                m.addition_count,
                m.deletion_count,
                m.diff_percent,
                analysis::insight(m).message()
            );
        }
    }
}

/// Show comparison progress indicator.
pub fn show_progress(progress: PageProgress) {
    if progress.page < progress.total {
        print!(
            "  Comparing  [{}/{}]  {:>3.0}%",
            progress.page,
            progress.total,
            progress.fraction() * 100.0
        );
        let _ = std::io::stdout().flush();
    }
}

pub fn print_truncation(t: Truncation, tier: Tier) {
    clear_line();
    println!();
    println!(
        "\x1b[33mNote:\x1b[0m compared the first {} of {} pages ({tier:?} plan page limit).",
        t.compared, t.available
    );
}

/// Print why a run did not complete. Nothing from the run is published.
pub fn print_abort(err: &CompareError) {
    clear_line();
    let label = match err {
        CompareError::Cancelled { .. } => "\x1b[33mCANCELLED\x1b[0m",
        CompareError::EmptyComparison { .. } => "\x1b[33mNOTHING TO COMPARE\x1b[0m",
        _ => "\x1b[31mFAILED\x1b[0m",
    };
    println!("  {label}  {}", err.chain());
    println!("No results were published; the previous comparison (if any) is unchanged.");
}

/// Print the final summary.
pub fn print_summary(summary: &RunSummary, elapsed: Duration, out_dir: &Path) {
    clear_line();
    println!();
    print!(
        "Pages:      {} compared, \x1b[31m{} with differences\x1b[0m",
        summary.pages_compared, summary.pages_with_difference
    );
    println!();
    println!(
        "Changes:    \x1b[34m+{}\x1b[0m added, \x1b[31m-{}\x1b[0m removed pixels",
        summary.additions, summary.deletions
    );
    println!("Time:       {}", format_duration(elapsed));
    println!("Report:     {}", out_dir.display());
}
