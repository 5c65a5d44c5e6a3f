//! Common test utilities for the sheetscan integration tests
//!
//! Synthetic answer-sheet builders shared by the segmentation and
//! orchestration suites. The sheets imitate a photographed form: light
//! paper, a header band the locator must skip, and two columns of filled
//! answer bubbles separated by a clear central gap.

use image::{Rgb, RgbImage};

pub const PAPER: Rgb<u8> = Rgb([235, 235, 235]);
pub const INK: Rgb<u8> = Rgb([25, 25, 25]);

/// Geometry of a generated sheet, in absolute pixel coordinates.
pub struct SheetLayout {
    pub grid_top: u32,
    pub grid_bottom: u32,
    /// First column of the left bubble group.
    pub left_start: u32,
    /// One past the last column of the left bubble group.
    pub left_end: u32,
    /// First column of the right bubble group.
    pub right_start: u32,
    /// One past the last column of the right bubble group.
    pub right_end: u32,
}

impl SheetLayout {
    /// The empty seam between the two bubble groups.
    pub fn gap(&self) -> (u32, u32) {
        (self.left_end, self.right_start)
    }
}

/// A blank sheet with no markings at all.
pub fn blank_sheet(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, PAPER)
}

/// A 400x600 sheet with a header line and an 11-question two-column grid.
///
/// Bubble squares are 12px wide so the default 15px threshold window
/// always sees paper around them, and question rows sit 9px apart so the
/// locator's run grouping (gap tolerance 10) reads the grid as one run.
pub fn answer_sheet() -> (RgbImage, SheetLayout) {
    let mut img = blank_sheet(400, 600);

    // Header text stripe, above the locator ROI (20% of 600 = 120).
    for y in 40..52 {
        for x in 60..340 {
            if (x + y) % 2 == 0 {
                img.put_pixel(x, y, INK);
            }
        }
    }

    let layout = SheetLayout {
        grid_top: 200,
        grid_bottom: 488,
        left_start: 40,
        left_end: 148,
        right_start: 220,
        right_end: 328,
    };

    // 11 question rows, 18px bubbles on a 27px pitch.
    for question in 0..11u32 {
        let y0 = layout.grid_top + question * 27;
        for group_start in [layout.left_start, layout.right_start] {
            // 4 alternatives per question, 12px bubbles on a 32px pitch.
            for alternative in 0..4u32 {
                let x0 = group_start + alternative * 32;
                fill_square(&mut img, x0, y0, 12, 18);
            }
        }
    }

    (img, layout)
}

fn fill_square(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, INK);
        }
    }
}
