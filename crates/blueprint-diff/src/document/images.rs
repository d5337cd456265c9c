use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::imageops::FilterType;
use tracing::debug;

use super::{Document, scaled_dimensions};
use crate::diff::PixelBuffer;

const PAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A document made of one image file per page.
pub struct ImageDocument {
    pages: Vec<PathBuf>,
}

impl ImageDocument {
    /// `source` is a directory (its images, sorted by file name), a single
    /// image file, or a glob pattern such as `scans/rev-b/*.png`.
    pub fn open(source: &Path) -> Result<Self> {
        let pages = if source.is_dir() {
            list_dir(source)?
        } else if source.is_file() {
            vec![source.to_path_buf()]
        } else {
            glob_pages(source)?
        };

        if pages.is_empty() {
            bail!("No page images found at {}", source.display());
        }
        debug!(source = %source.display(), pages = pages.len(), "opened page images");
        Ok(Self { pages })
    }

    fn page_path(&self, page: u32) -> Result<&Path> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .map(PathBuf::as_path)
            .with_context(|| {
                format!(
                    "Page {page} out of range (document has {} pages)",
                    self.pages.len()
                )
            })
    }
}

impl Document for ImageDocument {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    async fn render_page(&self, page: u32, scale: f64) -> Result<PixelBuffer> {
        let path = self.page_path(page)?.to_path_buf();
        tokio::task::spawn_blocking(move || load_scaled(&path, scale))
            .await
            .context("Page decode task panicked")?
    }
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    let mut pages = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .path();
        if path.is_file() && is_page_image(&path) {
            pages.push(path);
        }
    }
    sort_pages(&mut pages);
    Ok(pages)
}

fn glob_pages(pattern: &Path) -> Result<Vec<PathBuf>> {
    let pattern = pattern
        .to_str()
        .context("Page pattern is not valid UTF-8")?;
    let mut pages = Vec::new();
    for entry in glob::glob(pattern).with_context(|| format!("Invalid page pattern {pattern}"))? {
        let path = entry.context("Failed to read a page path")?;
        if path.is_file() && is_page_image(&path) {
            pages.push(path);
        }
    }
    sort_pages(&mut pages);
    Ok(pages)
}

/// Order page files the way a reader numbers them: `2.png` before `10.png`.
fn sort_pages(pages: &mut [PathBuf]) {
    pages.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}

/// Compare strings with runs of ASCII digits ordered by numeric value.
/// Equal values with more leading zeros sort later.
fn natural_cmp(mut a: &str, mut b: &str) -> Ordering {
    loop {
        let (Some(x), Some(y)) = (a.chars().next(), b.chars().next()) else {
            return a.len().cmp(&b.len());
        };

        let ord = if x.is_ascii_digit() && y.is_ascii_digit() {
            let (num_a, rest_a) = split_digits(a);
            let (num_b, rest_b) = split_digits(b);
            a = rest_a;
            b = rest_b;
            let (ta, tb) = (num_a.trim_start_matches('0'), num_b.trim_start_matches('0'));
            ta.len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| num_a.len().cmp(&num_b.len()))
        } else {
            a = &a[x.len_utf8()..];
            b = &b[y.len_utf8()..];
            x.cmp(&y)
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn load_scaled(path: &Path, scale: f64) -> Result<PixelBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_rgba8();
    let (w, h) = scaled_dimensions(img.width(), img.height(), scale);
    if (w, h) == img.dimensions() {
        return Ok(img);
    }
    Ok(image::imageops::resize(&img, w, h, FilterType::Triangle))
}
