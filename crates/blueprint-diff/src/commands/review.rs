use std::path::Path;

use anyhow::{Context, Result};

use crate::report::html;
use crate::store;

pub(crate) fn open_in_browser(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(target_os = "linux")]
    let cmd = "xdg-open";
    #[cfg(target_os = "windows")]
    let cmd = "start";

    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    std::process::Command::new(cmd)
        .arg(&path)
        .spawn()
        .context("Failed to open report in browser")?;
    Ok(())
}

/// `blueprint-diff review`: regenerate the HTML report from `summary.json`.
pub fn review(dir: &Path, open: bool) -> Result<()> {
    let record = store::load_record(dir)?;
    let path = html::write(dir, &record)?;
    println!(
        "Report written to {} ({} page(s), {} with differences)",
        path.display(),
        record.summary.pages_compared,
        record.summary.pages_with_difference
    );

    if open {
        open_in_browser(&path)?;
    }

    Ok(())
}
