use std::time::Instant;

use tracing::{debug, info, warn};

use super::{CancelFlag, ComparisonRun, PageProgress, RunRequest, Truncation};
use crate::diff::{self, DiffMetrics};
use crate::document::{Document, Side};
use crate::error::CompareError;

/// Compare the shared page range of two documents, one page at a time.
///
/// Each page is rendered on both sides and diffed before the next page
/// starts, so at most one page pair of buffers is alive at once.
/// `on_page` runs after every page with its progress and metrics.
///
/// Any failure or cancellation discards the pages compared so far: the
/// caller gets either a complete run or an error, never a partial run.
pub async fn run_comparison<B, A, F>(
    before: &B,
    after: &A,
    request: &RunRequest,
    cancel: &CancelFlag,
    mut on_page: F,
) -> Result<ComparisonRun, CompareError>
where
    B: Document,
    A: Document,
    F: FnMut(PageProgress, &DiffMetrics),
{
    let before_pages = before.page_count();
    let after_pages = after.page_count();
    let available = before_pages.min(after_pages);
    let total = match request.page_ceiling {
        Some(ceiling) => available.min(ceiling),
        None => available,
    };

    if total == 0 {
        return Err(CompareError::EmptyComparison {
            before_pages,
            after_pages,
            ceiling: request.page_ceiling,
        });
    }

    let truncation = (total < available).then_some(Truncation {
        available,
        compared: total,
    });
    if truncation.is_some() {
        info!(available, compared = total, "page ceiling reached, truncating run");
    }

    info!(
        pages = total,
        scale = request.scale,
        dx = request.offset.dx,
        dy = request.offset.dy,
        "starting comparison"
    );
    let run_start = Instant::now();
    let mut results: Vec<DiffMetrics> = Vec::with_capacity(total as usize);

    for page in 1..=total {
        let t0 = Instant::now();

        let left = render(before, Side::Before, page, request.scale, cancel).await?;
        let right = render(after, Side::After, page, request.scale, cancel).await?;
        let t1 = Instant::now();
        debug!(
            page,
            before = ?left.dimensions(),
            after = ?right.dimensions(),
            elapsed_ms = (t1 - t0).as_millis() as u64,
            "page rendered"
        );

        let offset = request.offset;
        let metrics = match tokio::task::spawn_blocking(move || {
            diff::compare(&left, &right, offset).on_page(page)
        })
        .await
        {
            Ok(m) => m,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        };
        debug!(
            page,
            diff_pixels = metrics.diff_pixel_count,
            additions = metrics.addition_count,
            deletions = metrics.deletion_count,
            has_difference = metrics.has_difference,
            elapsed_ms = t1.elapsed().as_millis() as u64,
            "page compared"
        );

        on_page(PageProgress { page, total }, &metrics);
        results.push(metrics);
    }

    info!(
        pages = total,
        with_difference = results.iter().filter(|m| m.has_difference).count(),
        elapsed_ms = run_start.elapsed().as_millis() as u64,
        "comparison complete"
    );

    Ok(ComparisonRun {
        request: *request,
        truncation,
        results,
    })
}

async fn render<D: Document>(
    doc: &D,
    side: Side,
    page: u32,
    scale: f64,
    cancel: &CancelFlag,
) -> Result<diff::PixelBuffer, CompareError> {
    if cancel.is_cancelled() {
        warn!(page, "comparison cancelled");
        return Err(CompareError::Cancelled { page });
    }
    doc.render_page(page, scale).await.map_err(|e| {
        // Ctrl-C also reaches rasterizer child processes, so a render that
        // fails after cancellation is reported as the cancellation.
        if cancel.is_cancelled() {
            warn!(page, %side, "comparison cancelled during render");
            return CompareError::Cancelled { page };
        }
        warn!(page, %side, error = %format!("{e:#}"), "page render failed, aborting run");
        CompareError::render(page, side, e)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{Result, bail};
    use image::Rgba;

    use super::*;
    use crate::diff::{AlignmentOffset, PixelBuffer};

    /// In-memory document that records which pages were rendered.
    struct FakeDocument {
        pages: Vec<PixelBuffer>,
        fail_on: Option<u32>,
        rendered: Mutex<Vec<u32>>,
    }

    impl FakeDocument {
        fn blank(count: u32) -> Self {
            Self::from_pages(
                (0..count)
                    .map(|_| PixelBuffer::from_pixel(24, 24, Rgba([255, 255, 255, 255])))
                    .collect(),
            )
        }

        fn from_pages(pages: Vec<PixelBuffer>) -> Self {
            Self {
                pages,
                fail_on: None,
                rendered: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, page: u32) -> Self {
            self.fail_on = Some(page);
            self
        }

        fn rendered(&self) -> Vec<u32> {
            self.rendered.lock().unwrap().clone()
        }
    }

    impl Document for FakeDocument {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        async fn render_page(&self, page: u32, _scale: f64) -> Result<PixelBuffer> {
            self.rendered.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                bail!("corrupt page data");
            }
            Ok(self.pages[(page - 1) as usize].clone())
        }
    }

    fn request(page_ceiling: Option<u32>) -> RunRequest {
        RunRequest {
            scale: 1.0,
            offset: AlignmentOffset::default(),
            page_ceiling,
        }
    }

    #[tokio::test]
    async fn ceiling_truncates_shared_range() {
        let before = FakeDocument::blank(20);
        let after = FakeDocument::blank(15);

        let run = run_comparison(&before, &after, &request(Some(10)), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap();

        let numbers: Vec<u32> = run.pages().iter().map(|m| m.page_number).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
        assert_eq!(
            run.truncation(),
            Some(Truncation {
                available: 15,
                compared: 10
            })
        );
        assert_eq!(before.rendered(), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unbounded_run_covers_shorter_document() {
        let before = FakeDocument::blank(5);
        let after = FakeDocument::blank(3);

        let run = run_comparison(&before, &after, &request(None), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap();
        assert_eq!(run.pages().len(), 3);
        assert_eq!(run.truncation(), None);
        assert_eq!(run.page_ceiling(), None);
    }

    #[tokio::test]
    async fn ceiling_above_range_is_not_a_truncation() {
        let before = FakeDocument::blank(4);
        let after = FakeDocument::blank(4);
        let run = run_comparison(&before, &after, &request(Some(10)), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap();
        assert_eq!(run.pages().len(), 4);
        assert!(run.truncation().is_none());
    }

    #[tokio::test]
    async fn render_failure_publishes_nothing() {
        let before = FakeDocument::blank(5);
        let after = FakeDocument::blank(5).failing_on(3);
        let mut seen = Vec::new();

        let err = run_comparison(&before, &after, &request(None), &CancelFlag::new(), |p, _| {
            seen.push(p.page)
        })
        .await
        .unwrap_err();

        match err {
            CompareError::PageRenderFailure { page, side, .. } => {
                assert_eq!(page, 3);
                assert_eq!(side, Side::After);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seen, vec![1, 2]);
        // No render calls after the failing page.
        assert_eq!(before.rendered(), vec![1, 2, 3]);
        assert_eq!(after.rendered(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn before_failure_skips_after_render() {
        let before = FakeDocument::blank(2).failing_on(1);
        let after = FakeDocument::blank(2);
        let err = run_comparison(&before, &after, &request(None), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::PageRenderFailure {
                page: 1,
                side: Side::Before,
                ..
            }
        ));
        assert!(after.rendered().is_empty());
    }

    #[tokio::test]
    async fn empty_range_is_reported() {
        let before = FakeDocument::blank(0);
        let after = FakeDocument::blank(3);
        let err = run_comparison(&before, &after, &request(None), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::EmptyComparison {
                before_pages: 0,
                after_pages: 3,
                ceiling: None
            }
        ));
        assert!(after.rendered().is_empty());
    }

    #[tokio::test]
    async fn zero_ceiling_is_an_empty_comparison() {
        let before = FakeDocument::blank(2);
        let after = FakeDocument::blank(2);
        let err = run_comparison(&before, &after, &request(Some(0)), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::EmptyComparison { .. }));
    }

    #[tokio::test]
    async fn cancellation_stops_rendering_and_discards_pages() {
        let before = FakeDocument::blank(4);
        let after = FakeDocument::blank(4);
        let cancel = CancelFlag::new();
        let handle = cancel.clone();

        let err = run_comparison(&before, &after, &request(None), &cancel, |p, _| {
            if p.page == 2 {
                handle.cancel();
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CompareError::Cancelled { page: 3 }));
        assert_eq!(before.rendered(), vec![1, 2]);
    }

    /// Fails its second page the way an interrupted rasterizer does:
    /// the cancel flag is already set when the error comes back.
    struct Interrupted(CancelFlag);

    impl Document for Interrupted {
        fn page_count(&self) -> u32 {
            3
        }

        async fn render_page(&self, page: u32, _scale: f64) -> Result<PixelBuffer> {
            if page == 2 {
                self.0.cancel();
                bail!("pdftoppm exited with signal: 2");
            }
            Ok(PixelBuffer::from_pixel(24, 24, Rgba([255, 255, 255, 255])))
        }
    }

    #[tokio::test]
    async fn render_killed_by_cancellation_is_cancelled() {
        let cancel = CancelFlag::new();
        let before = FakeDocument::blank(3);
        let after = Interrupted(cancel.clone());

        let err = run_comparison(&before, &after, &request(None), &cancel, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, CompareError::Cancelled { page: 2 }));
        assert_eq!(before.rendered(), vec![1, 2]);
    }

    #[tokio::test]
    async fn progress_reported_after_each_page() {
        let before = FakeDocument::blank(4);
        let after = FakeDocument::blank(4);
        let mut fractions = Vec::new();

        run_comparison(&before, &after, &request(None), &CancelFlag::new(), |p, m| {
            assert_eq!(p.page, m.page_number);
            fractions.push(p.fraction());
        })
        .await
        .unwrap();

        assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn offset_applies_to_every_page() {
        let shape = |dx: u32, dy: u32| {
            let mut img = PixelBuffer::from_pixel(60, 60, Rgba([255, 255, 255, 255]));
            for y in 10..30 {
                for x in 10..30 {
                    img.put_pixel(x + dx, y + dy, Rgba([0, 0, 0, 255]));
                }
            }
            img
        };
        let before = FakeDocument::from_pages(vec![shape(0, 0), shape(0, 0), shape(0, 0)]);
        let after = FakeDocument::from_pages(vec![shape(4, 2), shape(4, 2), shape(4, 2)]);
        let req = RunRequest {
            scale: 1.0,
            offset: AlignmentOffset::new(4, 2),
            page_ceiling: None,
        };

        let run = run_comparison(&before, &after, &req, &CancelFlag::new(), |_, _| {})
            .await
            .unwrap();
        assert_eq!(run.offset(), AlignmentOffset::new(4, 2));
        assert!(run.pages().iter().all(|m| m.diff_pixel_count == 0));
    }

    #[tokio::test]
    async fn changed_page_is_flagged() {
        let blank = || PixelBuffer::from_pixel(60, 60, Rgba([255, 255, 255, 255]));
        let mut revised = blank();
        for y in 0..30 {
            for x in 0..30 {
                revised.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let before = FakeDocument::from_pages(vec![blank(), blank()]);
        let after = FakeDocument::from_pages(vec![blank(), revised]);

        let run = run_comparison(&before, &after, &request(None), &CancelFlag::new(), |_, _| {})
            .await
            .unwrap();
        assert!(!run.pages()[0].has_difference);
        assert!(run.pages()[1].has_difference);
        assert_eq!(run.pages()[1].addition_count, 900);
    }
}
