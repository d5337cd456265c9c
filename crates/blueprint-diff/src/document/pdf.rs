use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::debug;

use super::Document;
use crate::diff::PixelBuffer;

/// PDF user-space units per inch; `scale = 1.0` renders at this DPI.
const POINTS_PER_INCH: f64 = 72.0;

/// PDF rasterized through poppler's `pdfinfo` and `pdftoppm` binaries.
pub struct PdfDocument {
    path: PathBuf,
    pages: u32,
}

impl PdfDocument {
    /// Read the page count with `pdfinfo`. Fails if poppler is missing or the
    /// file is not a readable PDF.
    pub async fn open(path: &Path) -> Result<Self> {
        let output = Command::new("pdfinfo")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to run pdfinfo (is poppler-utils installed?)")?;

        if !output.status.success() {
            bail!(
                "pdfinfo failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let pages = parse_page_count(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("Failed to read page count of {}", path.display()))?;
        debug!(path = %path.display(), pages, "opened PDF");

        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn render_page(&self, page: u32, scale: f64) -> Result<PixelBuffer> {
        if page == 0 || page > self.pages {
            bail!("Page {page} out of range (document has {} pages)", self.pages);
        }

        let page_arg = page.to_string();
        let dpi = format!("{}", POINTS_PER_INCH * scale);
        let output = Command::new("pdftoppm")
            .args(["-f", &page_arg, "-l", &page_arg, "-r", &dpi, "-png", "-singlefile"])
            .arg(&self.path)
            .arg("-")
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to run pdftoppm (is poppler-utils installed?)")?;

        if !output.status.success() {
            bail!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let png = output.stdout;
        debug!(page, bytes = png.len(), dpi = %dpi, "page rasterized");
        tokio::task::spawn_blocking(move || {
            image::load_from_memory(&png)
                .context("Failed to decode pdftoppm output")
                .map(|img| img.to_rgba8())
        })
        .await
        .context("Page decode task panicked")?
    }
}

/// Extract `Pages:` from `pdfinfo` output.
fn parse_page_count(info: &str) -> Result<u32> {
    let value = info
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .context("pdfinfo output has no Pages: line")?;
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid page count {:?}", value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDFINFO: &str = "\
Title:           A-201 Floor Plans
Creator:         Revit
Producer:        PDFlib+PDI
Tagged:          no
Pages:           14
Encrypted:       no
Page size:       2592 x 1728 pts
PDF version:     1.6
";

    #[test]
    fn page_count_from_pdfinfo() {
        assert_eq!(parse_page_count(PDFINFO).unwrap(), 14);
    }

    #[test]
    fn missing_pages_line_is_an_error() {
        let err = parse_page_count("Title: x\nEncrypted: no\n").unwrap_err();
        assert!(err.to_string().contains("no Pages: line"));
    }

    #[test]
    fn garbage_page_count_is_an_error() {
        assert!(parse_page_count("Pages:  many\n").is_err());
    }

    #[tokio::test]
    async fn out_of_range_page_fails_before_spawning() {
        let doc = PdfDocument {
            path: PathBuf::from("plans.pdf"),
            pages: 2,
        };
        assert!(doc.render_page(0, 1.0).await.is_err());
        assert!(doc.render_page(3, 1.0).await.is_err());
    }
}
