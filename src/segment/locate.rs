//! Answer-grid region location.
//!
//! Two detection strategies plus a fixed-band fallback, selected by
//! configuration (an enum, not a trait hierarchy — the strategies share no
//! state):
//!
//! - **Profile**: adaptive-threshold a vertical ROI that excludes header
//!   and footer, find the tallest run of content rows, then bound it
//!   horizontally by the content columns inside the run.
//! - **Contour**: threshold the whole image and take the largest external
//!   contour whose bounding box is plausibly the grid (between 10% and 90%
//!   of the image area, not spanning the full width or height — that would
//!   be the sheet's own border).
//! - **MidpointOnly**: a fixed full-width band; splitting happens at the
//!   midpoint downstream.
//!
//! Both detection strategies fail loudly (`NoRegionFound`/`RegionTooSmall`)
//! instead of handing an empty region to the splitter.

use image::{GrayImage, RgbImage};
use imageproc::contours::{BorderType, find_contours};

use super::projection::{col_profile_rows, content_runs, row_profile, widest_run};
use super::threshold::{binarize, binarize_gray, luma};
use crate::config::{LocatorStrategy, SegmentationConfig};
use crate::error::{SheetError, SheetResult};

/// A rectangle within a source image, half-open on the high edges.
///
/// Invariant: `x0 < x1`, `y0 < y1`, both within the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Locate the answer-grid region with the configured strategy.
pub fn locate_region(image: &RgbImage, config: &SegmentationConfig) -> SheetResult<Region> {
    match config.strategy {
        LocatorStrategy::Profile => locate_by_profile(image, config),
        LocatorStrategy::Contour => locate_by_contour(image, config),
        LocatorStrategy::MidpointOnly => roi_band(image, config),
    }
}

/// Projection-profile strategy.
fn locate_by_profile(image: &RgbImage, config: &SegmentationConfig) -> SheetResult<Region> {
    let (width, height) = image.dimensions();
    let y_start = (height as f32 * config.h_start_frac) as u32;
    let y_end = ((height as f32 * config.h_end_frac) as u32).min(height);
    if y_end <= y_start {
        return Err(SheetError::no_region("profile", "empty vertical ROI"));
    }

    // Threshold only the ROI rows; the luma buffer is row-major, so the
    // ROI is a contiguous slice.
    let gray = luma(image);
    let roi = &gray[(y_start as usize) * (width as usize)..(y_end as usize) * (width as usize)];
    let map = binarize_gray(roi, width, y_end - y_start, config.block_size, config.c);

    let rows = row_profile(&map);
    let row_thresh = width as f32 * config.row_thresh_frac;
    let runs = content_runs(&rows, row_thresh, config.row_gap as usize);
    let run = widest_run(&runs)
        .ok_or_else(|| SheetError::no_region("profile", "no content rows in ROI"))?;

    if (run.extent() as u32) < config.min_block_height {
        return Err(SheetError::region_too_small(
            run.extent() as u32,
            config.min_block_height,
        ));
    }

    let cols = col_profile_rows(&map, run.start, run.end);
    let col_thresh = run.extent() as f32 * config.col_thresh_frac;
    let first = cols.iter().position(|&c| c as f32 > col_thresh);
    let last = cols.iter().rposition(|&c| c as f32 > col_thresh);
    let (x0, x1) = match (first, last) {
        (Some(first), Some(last)) => (first as u32, last as u32),
        _ => {
            return Err(SheetError::no_region(
                "profile",
                "no content columns in the selected run",
            ));
        }
    };

    Ok(Region {
        x0,
        y0: y_start + run.start as u32,
        x1: x1 + 1,
        y1: y_start + run.end as u32 + 1,
    })
}

/// Contour strategy (legacy).
fn locate_by_contour(image: &RgbImage, config: &SegmentationConfig) -> SheetResult<Region> {
    let (width, height) = image.dimensions();
    let map = binarize(image, config.block_size, config.c);
    let binary = GrayImage::from_raw(width, height, map.data().to_vec())
        .expect("binary map dimensions match its buffer");

    let image_area = (width as u64) * (height as u64);
    let contours = find_contours::<u32>(&binary);

    let mut best: Option<(u64, Region)> = None;
    for contour in &contours {
        if contour.border_type != BorderType::Outer || contour.points.is_empty() {
            continue;
        }
        let min_x = contour.points.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = contour.points.iter().map(|p| p.x).max().unwrap_or(0);
        let min_y = contour.points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = contour.points.iter().map(|p| p.y).max().unwrap_or(0);
        let bw = max_x - min_x + 1;
        let bh = max_y - min_y + 1;
        let area = (bw as u64) * (bh as u64);

        // The grid is big but never the whole sheet: reject boxes outside
        // (10%, 90%) of the image area and boxes spanning the full width
        // or height (the sheet's own outer border).
        if area * 10 <= image_area || area * 10 >= image_area * 9 {
            continue;
        }
        if bw >= width || bh >= height {
            continue;
        }
        if best.map(|(best_area, _)| area > best_area).unwrap_or(true) {
            best = Some((
                area,
                Region {
                    x0: min_x,
                    y0: min_y,
                    x1: max_x + 1,
                    y1: max_y + 1,
                },
            ));
        }
    }

    best.map(|(_, region)| region)
        .ok_or_else(|| SheetError::no_region("contour", "no contour passed the area filter"))
}

/// Fixed full-width band for the midpoint-only strategy.
fn roi_band(image: &RgbImage, config: &SegmentationConfig) -> SheetResult<Region> {
    let (width, height) = image.dimensions();
    let y0 = (height as f32 * config.skip_top_frac) as u32;
    let y1 = ((height as f32 * (1.0 - config.skip_bottom_frac)) as u32).min(height);
    if y1 <= y0 || width == 0 {
        return Err(SheetError::no_region("midpoint-only", "empty ROI band"));
    }
    Ok(Region {
        x0: 0,
        y0,
        x1: width,
        y1,
    })
}
