use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use super::review::open_in_browser;
use crate::config::ResolvedRunConfig;
use crate::document::{AnyDocument, Document, Side};
use crate::error::CompareError;
use crate::report::terminal;
use crate::run::{CancelFlag, RunRequest, run_comparison};
use crate::session::{Phase, SessionEvent, SessionState, reduce};
use crate::store;

const EXIT_SAME: i32 = 0;
const EXIT_DIFFERENT: i32 = 1;
/// Exit code when the run did not complete.
const EXIT_ABORTED: i32 = 2;

/// Exit code for where a session ended up.
fn exit_code(session: &SessionState) -> i32 {
    match (&session.phase, &session.last_completed) {
        (Phase::Completed, Some(run)) if run.pages().iter().any(|m| m.has_difference) => {
            EXIT_DIFFERENT
        }
        (Phase::Completed, Some(_)) => EXIT_SAME,
        _ => EXIT_ABORTED,
    }
}

async fn open_side(side: Side, path: &Path) -> Result<AnyDocument, CompareError> {
    AnyDocument::open(path)
        .await
        .map_err(|source| CompareError::InputUnavailable {
            side,
            path: path.to_path_buf(),
            source: source.into(),
        })
}

/// `blueprint-diff compare`: rasterize, diff, publish, report.
/// Returns exit code: 0 = no page differs, 1 = some page differs, 2 = aborted.
pub async fn compare(
    config: ResolvedRunConfig,
    before: &Path,
    after: &Path,
    open: bool,
) -> Result<i32> {
    debug!(?config, "resolved run config");
    let run_start = Instant::now();

    let documents = match open_side(Side::Before, before).await {
        Ok(b) => open_side(Side::After, after).await.map(|a| (b, a)),
        Err(e) => Err(e),
    };
    let (before_doc, after_doc) = match documents {
        Ok(docs) => docs,
        Err(e) => {
            terminal::print_abort(&e);
            return Ok(EXIT_ABORTED);
        }
    };
    println!(
        "Comparing {} ({} pages) against {} ({} pages)",
        before.display(),
        before_doc.page_count(),
        after.display(),
        after_doc.page_count(),
    );
    println!();

    // Ctrl-C stops the run between renders.
    let cancel = CancelFlag::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let request = RunRequest {
        scale: config.scale,
        offset: config.offset,
        page_ceiling: config.page_ceiling,
    };

    let mut session = reduce(SessionState::default(), SessionEvent::Started);
    let mut page_start = Instant::now();
    let outcome = run_comparison(&before_doc, &after_doc, &request, &cancel, |progress, m| {
        terminal::print_page_line(m, page_start.elapsed());
        terminal::show_progress(progress);
        page_start = Instant::now();
        session = reduce(
            std::mem::take(&mut session),
            SessionEvent::Progressed(progress),
        );
    })
    .await;
    watcher.abort();

    session = match outcome {
        Ok(run) => reduce(session, SessionEvent::Finished(run)),
        Err(e) => {
            terminal::print_abort(&e);
            match e {
                CompareError::Cancelled { .. } => reduce(session, SessionEvent::Cancelled),
                other => reduce(session, SessionEvent::Aborted(other.chain())),
            }
        }
    };

    let code = exit_code(&session);
    if code == EXIT_ABORTED {
        return Ok(code);
    }
    let run = session
        .last_completed
        .context("Completed session has no run")?;

    if let Some(truncation) = run.truncation() {
        terminal::print_truncation(truncation, config.tier);
    }

    let record = store::publish(&run, &config.output_dir)?;
    terminal::print_summary(&record.summary, run_start.elapsed(), &config.output_dir);

    if open {
        open_in_browser(&config.output_dir.join(store::REPORT_FILE))?;
    }

    Ok(code)
}
