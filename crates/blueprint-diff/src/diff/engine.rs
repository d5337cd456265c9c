use image::{Rgb, Rgba};

use super::{AlignmentOffset, DiffMetrics, DiffParams, PixelBuffer, percent_of};

/// Background assumed for "after" pixels that fall outside its bounds.
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// New or darker content.
const ADDITION: Rgba<u8> = Rgba([0, 70, 255, 255]);

/// Removed content (the page got lighter).
const DELETION: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Compare two rasterized pages with the calibrated thresholds.
///
/// `before` defines the canvas: the result has its dimensions. `after` may be
/// any size. The returned metrics report page 1; see [`DiffMetrics::on_page`].
pub fn compare(before: &PixelBuffer, after: &PixelBuffer, offset: AlignmentOffset) -> DiffMetrics {
    compare_with(before, after, offset, &DiffParams::default())
}

/// Three passes over the canvas:
/// 1. Mask: per-pixel channel distance against the offset "after" pixel.
/// 2. Cluster: keep only blocks with enough masked pixels.
/// 3. Render: colour masked pixels in kept blocks, grey out the rest.
pub fn compare_with(
    before: &PixelBuffer,
    after: &PixelBuffer,
    offset: AlignmentOffset,
    params: &DiffParams,
) -> DiffMetrics {
    let (width, height) = before.dimensions();
    let mask = change_mask(before, after, offset, params);
    let blocks = BlockGrid::cluster(&mask, width, height, params);

    let mut visualization = PixelBuffer::new(width, height);
    let mut addition_count: u64 = 0;
    let mut deletion_count: u64 = 0;

    for (x, y, out) in visualization.enumerate_pixels_mut() {
        let idx = y as usize * width as usize + x as usize;
        let Rgba([r, g, b, _]) = *before.get_pixel(x, y);

        if mask[idx] && blocks.is_real(x, y) {
            let other = sample(after, x, y, offset);
            if is_deletion([r, g, b], other.0, params.deletion_margin) {
                deletion_count += 1;
                *out = DELETION;
            } else {
                addition_count += 1;
                *out = ADDITION;
            }
        } else {
            let v = context_grey(r, g, b);
            *out = Rgba([v, v, v, 255]);
        }
    }

    let diff_pixel_count = addition_count + deletion_count;
    let total = u64::from(width) * u64::from(height);

    DiffMetrics {
        page_number: 1,
        width,
        height,
        diff_pixel_count,
        addition_count,
        deletion_count,
        diff_percent: percent_of(diff_pixel_count, total),
        has_difference: blocks.real_count > 0 && diff_pixel_count >= params.significance_floor,
        visualization,
    }
}

/// RGB of the "after" pixel that lines up with `(x, y)` of "before".
/// Anything outside `after` reads as white paper; no clamping or wrapping.
fn sample(after: &PixelBuffer, x: u32, y: u32, offset: AlignmentOffset) -> Rgb<u8> {
    let ax = i64::from(x) + i64::from(offset.dx);
    let ay = i64::from(y) + i64::from(offset.dy);
    if ax < 0 || ay < 0 || ax >= i64::from(after.width()) || ay >= i64::from(after.height()) {
        return WHITE;
    }
    let Rgba([r, g, b, _]) = *after.get_pixel(ax as u32, ay as u32);
    Rgb([r, g, b])
}

/// Sum of absolute channel differences, alpha ignored.
fn channel_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&p, &q)| u32::from(p.abs_diff(q)))
        .sum()
}

fn change_mask(
    before: &PixelBuffer,
    after: &PixelBuffer,
    offset: AlignmentOffset,
    params: &DiffParams,
) -> Vec<bool> {
    before
        .enumerate_pixels()
        .map(|(x, y, px)| {
            let Rgba([r, g, b, _]) = *px;
            let other = sample(after, x, y, offset);
            channel_distance([r, g, b], other.0) > params.mask_threshold
        })
        .collect()
}

/// "After" brighter than "before" by more than `margin` in any channel.
fn is_deletion(before: [u8; 3], after: [u8; 3], margin: i32) -> bool {
    before
        .iter()
        .zip(after.iter())
        .any(|(&b, &a)| i32::from(b) < i32::from(a) - margin)
}

/// Washed-out grey for unchanged context: `120 + 0.53 * mean(R, G, B)`,
/// rounded half up. Integer arithmetic keeps ties exact.
fn context_grey(r: u8, g: u8, b: u8) -> u8 {
    let sum = u32::from(r) + u32::from(g) + u32::from(b);
    (120 + (53 * sum + 150) / 300).min(255) as u8
}

/// Non-overlapping square blocks covering the canvas. Edge blocks are
/// clipped to the canvas and use the same pixel threshold.
struct BlockGrid {
    size: u32,
    cols: u32,
    real: Vec<bool>,
    real_count: usize,
}

impl BlockGrid {
    fn cluster(mask: &[bool], width: u32, height: u32, params: &DiffParams) -> Self {
        let size = params.block_size.max(1);
        let cols = width.div_ceil(size);
        let rows = height.div_ceil(size);

        let mut counts = vec![0u32; cols as usize * rows as usize];
        for (idx, _) in mask.iter().enumerate().filter(|(_, changed)| **changed) {
            let x = (idx % width as usize) as u32;
            let y = (idx / width as usize) as u32;
            counts[((y / size) * cols + x / size) as usize] += 1;
        }

        let real: Vec<bool> = counts
            .iter()
            .map(|&n| n >= params.block_min_pixels)
            .collect();
        let real_count = real.iter().filter(|r| **r).count();

        Self {
            size,
            cols,
            real,
            real_count,
        }
    }

    fn is_real(&self, x: u32, y: u32) -> bool {
        self.real[((y / self.size) * self.cols + x / self.size) as usize]
    }
}
