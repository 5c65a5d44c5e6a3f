//! Valley-based column splitting.
//!
//! The two answer columns of the located region are separated by a band of
//! low foreground density. The split column is found by sliding a window
//! across a central search band and taking the center of the minimum-mean
//! position; a single noisy column cannot move it. When the band shows no
//! real density contrast against its flanks the region is cut at the exact
//! midpoint instead.

use image::{RgbImage, imageops};

use super::locate::Region;
use super::projection::{col_profile, min_mean_window};
use super::threshold::binarize;
use crate::config::{LocatorStrategy, SegmentationConfig};
use crate::error::{SheetError, SheetResult};

/// Band-minimum-to-flank-maximum ratio below which the valley is trusted.
const CONTRAST_RATIO: f32 = 0.3;

/// Which half of the located region a block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSide {
    Left,
    Right,
}

impl BlockSide {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// One independently analyzable sub-region of the answer sheet.
#[derive(Debug, Clone)]
pub struct Block {
    /// Which side of the split this block covers.
    pub side: BlockSide,
    /// 1-based ordinal, left before right.
    pub block_id: u32,
    /// Cropped pixel data for this block.
    pub image: RgbImage,
    /// Position of the block within the source image.
    pub region: Region,
}

impl Block {
    /// Whether the block has any pixels to analyze.
    pub fn is_nonempty(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }
}

/// Split a located region into its left and right blocks.
///
/// The returned blocks partition the region exactly: left is `[0, split)`,
/// right is `[split, W)`, with `0 < split < W` guaranteed.
pub fn split_region(
    image: &RgbImage,
    region: &Region,
    config: &SegmentationConfig,
) -> SheetResult<Vec<Block>> {
    let width = region.width();
    let height = region.height();
    if width < 2 {
        return Err(SheetError::empty_block("right"));
    }

    let crop = imageops::crop_imm(image, region.x0, region.y0, width, height).to_image();

    let split = match config.strategy {
        LocatorStrategy::MidpointOnly => width / 2,
        _ => find_valley_split(&crop, config),
    };
    tracing::debug!(split, width, "column seam selected");

    if split == 0 {
        return Err(SheetError::empty_block("left"));
    }
    if split >= width {
        return Err(SheetError::empty_block("right"));
    }

    let left = imageops::crop_imm(&crop, 0, 0, split, height).to_image();
    let right = imageops::crop_imm(&crop, split, 0, width - split, height).to_image();

    Ok(vec![
        Block {
            side: BlockSide::Left,
            block_id: 1,
            image: left,
            region: Region {
                x0: region.x0,
                y0: region.y0,
                x1: region.x0 + split,
                y1: region.y1,
            },
        },
        Block {
            side: BlockSide::Right,
            block_id: 2,
            image: right,
            region: Region {
                x0: region.x0 + split,
                y0: region.y0,
                x1: region.x1,
                y1: region.y1,
            },
        },
    ])
}

/// Find the split column inside the central search band.
///
/// The band is `W/6` wide, centered at `W/2`. If the band minimum is not
/// below [`CONTRAST_RATIO`] of the maximum flanking density there is no
/// detectable seam (single-column or washed-out scans) and the midpoint is
/// used.
fn find_valley_split(crop: &RgbImage, config: &SegmentationConfig) -> u32 {
    let width = crop.width() as usize;
    let map = binarize(crop, config.block_size, config.c);
    let profile = col_profile(&map);

    let center = width / 2;
    let band_half = (width / 12).max(1);
    let band_start = center.saturating_sub(band_half);
    let band_end = (center + band_half).min(width);

    let band_min = match profile[band_start..band_end].iter().min() {
        Some(&min) => min,
        None => return (width / 2) as u32,
    };
    let flank_max = profile[..band_start]
        .iter()
        .chain(profile[band_end..].iter())
        .max()
        .copied()
        .unwrap_or(0);

    if flank_max == 0 || (band_min as f32) >= CONTRAST_RATIO * flank_max as f32 {
        return (width / 2) as u32;
    }

    let window = (config.window_size as usize).min(band_end - band_start);
    match min_mean_window(&profile, band_start, band_end, window) {
        Some(start) => (start + window / 2) as u32,
        None => (width / 2) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const PAPER: Rgb<u8> = Rgb([235, 235, 235]);
    const INK: Rgb<u8> = Rgb([25, 25, 25]);

    /// Two dense columns separated by a clean gap at `[gap_start, gap_end)`.
    fn two_column_sheet(w: u32, h: u32, gap_start: u32, gap_end: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(w, h, PAPER);
        for y in 0..h {
            for x in 0..w {
                if x < gap_start || x >= gap_end {
                    if (x + y) % 2 == 0 {
                        img.put_pixel(x, y, INK);
                    }
                }
            }
        }
        img
    }

    fn full_region(img: &RgbImage) -> Region {
        Region {
            x0: 0,
            y0: 0,
            x1: img.width(),
            y1: img.height(),
        }
    }

    #[test]
    fn split_partitions_the_region() {
        let img = two_column_sheet(300, 200, 140, 160);
        let blocks = split_region(&img, &full_region(&img), &SegmentationConfig::default())
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_id, 1);
        assert_eq!(blocks[1].block_id, 2);
        assert_eq!(blocks[0].side, BlockSide::Left);
        assert_eq!(blocks[1].side, BlockSide::Right);
        let split = blocks[0].image.width();
        assert!(split > 0 && split < 300);
        assert_eq!(split + blocks[1].image.width(), 300);
        assert_eq!(blocks[0].region.x1, blocks[1].region.x0);
        assert!(blocks.iter().all(Block::is_nonempty));
    }

    #[test]
    fn split_lands_inside_the_gap() {
        let img = two_column_sheet(300, 200, 135, 165);
        let blocks = split_region(&img, &full_region(&img), &SegmentationConfig::default())
            .unwrap();
        let split = blocks[0].image.width();
        assert!(
            (135..=165).contains(&split),
            "split {split} outside the gap"
        );
    }

    #[test]
    fn windowed_search_skips_a_noise_spike_in_a_column() {
        // A thin blank slit inside the left column imitates a scanning
        // artifact; the real seam is the wide central gap. The slit sits
        // outside the central band, so the split must land in the gap.
        let mut img = two_column_sheet(300, 200, 140, 160);
        for y in 0..200 {
            img.put_pixel(60, y, PAPER);
            img.put_pixel(61, y, PAPER);
        }
        let blocks = split_region(&img, &full_region(&img), &SegmentationConfig::default())
            .unwrap();
        let split = blocks[0].image.width();
        assert!((140..=160).contains(&split));
    }

    #[test]
    fn no_contrast_falls_back_to_midpoint() {
        // Uniformly dense content, no seam anywhere.
        let img = two_column_sheet(200, 100, 0, 0);
        let blocks = split_region(&img, &full_region(&img), &SegmentationConfig::default())
            .unwrap();
        assert_eq!(blocks[0].image.width(), 100);
        assert_eq!(blocks[1].image.width(), 100);
    }

    #[test]
    fn midpoint_strategy_skips_the_valley_search() {
        let config = SegmentationConfig {
            strategy: LocatorStrategy::MidpointOnly,
            ..SegmentationConfig::default()
        };
        // Off-center gap that the valley search would find; midpoint-only
        // must ignore it.
        let img = two_column_sheet(300, 200, 130, 150);
        let blocks = split_region(&img, &full_region(&img), &config).unwrap();
        assert_eq!(blocks[0].image.width(), 150);
    }

    #[test]
    fn degenerate_region_is_rejected() {
        let img = RgbImage::from_pixel(10, 10, PAPER);
        let region = Region {
            x0: 4,
            y0: 0,
            x1: 5,
            y1: 10,
        };
        let err = split_region(&img, &region, &SegmentationConfig::default()).unwrap_err();
        assert_eq!(err.category(), "empty_block");
    }
}
