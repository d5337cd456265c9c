use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diff::{AlignmentOffset, DiffMetrics, PixelBuffer};
use crate::report::analysis::{self, Insight, RunSummary, Severity};
use crate::report::html;
use crate::run::ComparisonRun;

pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "report.html";

/// File name of a page's visualization inside a published run.
pub fn page_file_name(page: u32) -> String {
    format!("page-{page:03}.png")
}

/// Serializable view of one page, as written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub width: u32,
    pub height: u32,
    pub diff_pixels: u64,
    pub additions: u64,
    pub deletions: u64,
    pub diff_percent: f64,
    pub has_difference: bool,
    pub severity: Severity,
    pub insight: Insight,
    /// Visualization file, relative to the run directory.
    pub image: String,
}

impl PageRecord {
    pub fn from_metrics(m: &DiffMetrics) -> Self {
        Self {
            page: m.page_number,
            width: m.width,
            height: m.height,
            diff_pixels: m.diff_pixel_count,
            additions: m.addition_count,
            deletions: m.deletion_count,
            diff_percent: m.diff_percent,
            has_difference: m.has_difference,
            severity: analysis::classify(m),
            insight: analysis::insight(m),
            image: page_file_name(m.page_number),
        }
    }
}

/// Everything about a published run except the pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub scale: f64,
    pub offset: AlignmentOffset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ceiling: Option<u32>,
    /// Pages both documents had, when the ceiling cut the run short.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_from: Option<u32>,
    pub summary: RunSummary,
    pub pages: Vec<PageRecord>,
}

impl RunRecord {
    pub fn from_run(run: &ComparisonRun) -> Self {
        Self {
            scale: run.scale(),
            offset: run.offset(),
            page_ceiling: run.page_ceiling(),
            truncated_from: run.truncation().map(|t| t.available),
            summary: analysis::summary(run),
            pages: run.pages().iter().map(PageRecord::from_metrics).collect(),
        }
    }
}

pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    buffer
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(png)
}

/// Write a completed run to `out_dir`, replacing what was there.
///
/// Files are written into a staging directory next to `out_dir` and swapped
/// in by rename once all of them exist. If anything fails the previously
/// published run stays as it was.
pub fn publish(run: &ComparisonRun, out_dir: &Path) -> Result<RunRecord> {
    ensure_replaceable(out_dir)?;
    let staging = sibling(out_dir, "staging")?;
    let previous = sibling(out_dir, "previous")?;

    if let Some(parent) = staging.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    std::fs::create_dir_all(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))?;

    let record = match write_run(run, &staging) {
        Ok(record) => record,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }
    };

    swap_in(&staging, out_dir, &previous)?;
    debug!(dir = %out_dir.display(), pages = record.pages.len(), "run published");
    Ok(record)
}

fn write_run(run: &ComparisonRun, dir: &Path) -> Result<RunRecord> {
    for page in run.pages() {
        let path = dir.join(page_file_name(page.page_number));
        let png = encode_png(&page.visualization)?;
        std::fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let record = RunRecord::from_run(run);
    write_record(dir, &record)?;
    html::write(dir, &record)?;
    Ok(record)
}

pub fn write_record(dir: &Path, record: &RunRecord) -> Result<()> {
    let path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(record).context("Failed to serialize run summary")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_record(dir: &Path) -> Result<RunRecord> {
    let path = dir.join(SUMMARY_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} (has a comparison been published here?)", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Publishing replaces `out_dir` wholesale, so it must be missing, empty, or
/// a run published earlier.
fn ensure_replaceable(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    if !out_dir.is_dir() {
        bail!("Output path {} is not a directory", out_dir.display());
    }
    if out_dir.join(SUMMARY_FILE).is_file() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(out_dir)
        .with_context(|| format!("Failed to read {}", out_dir.display()))?;
    if entries.next().is_some() {
        bail!(
            "Output directory {} is not empty and holds no published run; \
             choose an empty or new directory",
            out_dir.display()
        );
    }
    Ok(())
}

/// `<parent>/.<name>.<tag>` next to `dir`.
fn sibling(dir: &Path, tag: &str) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .with_context(|| format!("Output path {} has no directory name", dir.display()))?;
    let sibling = format!(".{}.{tag}", name.to_string_lossy());
    Ok(dir.with_file_name(sibling))
}

fn swap_in(staging: &Path, out_dir: &Path, previous: &Path) -> Result<()> {
    if previous.exists() {
        std::fs::remove_dir_all(previous)
            .with_context(|| format!("Failed to clear {}", previous.display()))?;
    }

    let had_previous = out_dir.exists();
    if had_previous {
        std::fs::rename(out_dir, previous)
            .with_context(|| format!("Failed to move aside {}", out_dir.display()))?;
    }

    if let Err(e) = std::fs::rename(staging, out_dir) {
        if had_previous && let Err(restore) = std::fs::rename(previous, out_dir) {
            warn!(error = %restore, "failed to restore previous run");
        }
        let _ = std::fs::remove_dir_all(staging);
        bail!("Failed to publish run to {}: {e}", out_dir.display());
    }

    if had_previous {
        let _ = std::fs::remove_dir_all(previous);
    }
    Ok(())
}
