use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::report::analysis::Severity;
use crate::store::{PageRecord, REPORT_FILE, RunRecord};

fn page_row(page: &PageRecord) -> String {
    let badge = match page.severity {
        Severity::Identical => "same",
        Severity::Negligible => "noise",
        Severity::Significant => "diff",
    };
    format!(
        r#"        <tr class="{badge}">
          <td class="page">{number}</td>
          <td><span class="badge {badge}">{label}</span></td>
          <td class="stats">
            <div><span class="add">+{additions}</span> / <span class="del">&minus;{deletions}</span> px</div>
            <div>{percent:.2}% of {width}&times;{height}</div>
          </td>
          <td class="insight">{insight}</td>
          <td><a href="{image}"><img src="{image}" alt="page {number} difference" loading="lazy" /></a></td>
        </tr>
"#,
        number = page.page,
        label = page.severity.label(),
        additions = page.additions,
        deletions = page.deletions,
        percent = page.diff_percent,
        width = page.width,
        height = page.height,
        insight = html_escape(page.insight.message()),
        image = html_escape(&page.image),
    )
}

pub fn render(record: &RunRecord) -> String {
    let created_at = utc_timestamp();
    let s = &record.summary;
    let summary = format!(
        "{} page(s) compared, {} with differences &middot; scale {} &middot; offset {}",
        s.pages_compared,
        s.pages_with_difference,
        record.scale,
        html_escape(&record.offset.to_string()),
    );
    let notice = match record.truncated_from {
        Some(available) => format!(
            r#"<div class="notice">Only the first {} of {available} pages were compared (page limit).</div>"#,
            s.pages_compared
        ),
        None => String::new(),
    };
    let rows: String = record.pages.iter().map(page_row).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Revision comparison</title>
  <style>
    :root {{ color-scheme: light; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      margin: 0; padding: 24px;
      background: #f6f7f9; color: #1f2933;
    }}
    h1 {{ margin: 0 0 8px; font-size: 22px; }}
    .meta {{ margin-bottom: 16px; color: #52606d; font-size: 14px; }}
    .legend span {{ margin-right: 16px; }}
    .notice {{ margin-bottom: 16px; padding: 8px 12px; background: #fef3c7; color: #92400e; font-size: 14px; }}
    table {{ width: 100%; border-collapse: collapse; background: #fff; box-shadow: 0 2px 6px rgba(0,0,0,0.05); }}
    th, td {{ border: 1px solid #e4e7eb; padding: 8px; vertical-align: top; text-align: left; }}
    th {{ background: #f0f4f8; font-weight: 600; font-size: 14px; }}
    td img {{ max-width: 100%; height: auto; display: block; background: #fff; }}
    td.page {{ width: 48px; font-weight: 600; }}
    td.stats, td.insight {{ font-size: 13px; width: 18%; }}
    .add {{ color: #0046ff; font-weight: 600; }}
    .del {{ color: #ff0000; font-weight: 600; }}
    .badge {{ font-size: 11px; padding: 1px 6px; border-radius: 3px; font-weight: 600; }}
    .badge.same {{ background: #e3f9e5; color: #1f6f2b; }}
    .badge.noise {{ background: #f0f4f8; color: #52606d; }}
    .badge.diff {{ background: #ffe3e3; color: #ab091e; }}
  </style>
</head>
<body>
  <h1>Revision comparison</h1>
  <div class="meta">Generated at {created_at} &middot; {summary}</div>
  <div class="meta legend"><span class="add">&#9632; added</span><span class="del">&#9632; removed</span></div>
  {notice}
  <table>
    <thead>
      <tr>
        <th>Page</th>
        <th>Severity</th>
        <th>Changes</th>
        <th>Insight</th>
        <th>Difference</th>
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>"##
    )
}

/// Write `report.html` into `dir` and return its path.
pub fn write(dir: &Path, record: &RunRecord) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    std::fs::write(&path, render(record))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn utc_timestamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (s, m, h) = (secs % 60, (secs / 60) % 60, (secs / 3600) % 24);
    let (y, mo, d) = civil_from_days(secs / 86400);
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{m:02}:{s:02}Z")
}

/// Days since 1970-01-01 to (year, month, day), Howard Hinnant's algorithm.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + u64::from(m <= 2);
    (y, m, d)
}
