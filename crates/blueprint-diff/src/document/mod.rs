pub mod images;
pub mod pdf;

use std::fmt;
use std::future::Future;
use std::path::Path;

use anyhow::Result;

pub use self::images::ImageDocument;
pub use self::pdf::PdfDocument;
use crate::diff::PixelBuffer;

/// A paged document that can be rasterized one page at a time.
pub trait Document {
    fn page_count(&self) -> u32;

    /// Rasterize `page` (1-based) at `scale`. The buffer is
    /// `floor(native_width * scale) x floor(native_height * scale)`.
    fn render_page(&self, page: u32, scale: f64) -> impl Future<Output = Result<PixelBuffer>> + Send;
}

/// Which input of a comparison a document (or failure) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

/// Document adapter picked from the input path.
pub enum AnyDocument {
    Pdf(PdfDocument),
    Images(ImageDocument),
}

impl AnyDocument {
    /// `.pdf` files go through poppler; anything else is treated as page
    /// images (a directory, a glob pattern, or one image file).
    pub async fn open(path: &Path) -> Result<Self> {
        let is_pdf = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            Ok(Self::Pdf(PdfDocument::open(path).await?))
        } else {
            Ok(Self::Images(ImageDocument::open(path)?))
        }
    }
}

impl Document for AnyDocument {
    fn page_count(&self) -> u32 {
        match self {
            Self::Pdf(d) => d.page_count(),
            Self::Images(d) => d.page_count(),
        }
    }

    async fn render_page(&self, page: u32, scale: f64) -> Result<PixelBuffer> {
        match self {
            Self::Pdf(d) => d.render_page(page, scale).await,
            Self::Images(d) => d.render_page(page, scale).await,
        }
    }
}

/// Pixel size of a page scaled by `scale`, rounded down, at least 1x1.
pub(crate) fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_axis = |v: u32| ((f64::from(v) * scale).floor() as u32).max(1);
    (scale_axis(width), scale_axis(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_dimensions_round_down() {
        assert_eq!(scaled_dimensions(100, 50, 1.0), (100, 50));
        assert_eq!(scaled_dimensions(100, 50, 1.5), (150, 75));
        assert_eq!(scaled_dimensions(101, 51, 0.5), (50, 25));
        assert_eq!(scaled_dimensions(3, 3, 0.1), (1, 1));
    }

    #[tokio::test]
    async fn missing_input_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AnyDocument::open(&dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn non_pdf_paths_open_as_images() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("sheet.png");
        PixelBuffer::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]))
            .save(&page)
            .unwrap();

        let doc = AnyDocument::open(&page).await.unwrap();
        assert!(matches!(doc, AnyDocument::Images(_)));
        assert_eq!(doc.page_count(), 1);
        let img = doc.render_page(1, 2.0).await.unwrap();
        assert_eq!(img.dimensions(), (8, 8));
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::Before.to_string(), "before");
        assert_eq!(Side::After.to_string(), "after");
    }
}
