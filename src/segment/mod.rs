//! # Answer-Sheet Segmentation
//!
//! Synchronous, CPU-bound segmentation of a photographed answer sheet into
//! its two analyzable column blocks. The stages form a linear pipeline:
//!
//! 1. **Thresholding**: adaptive local binarization of a pixel region
//! 2. **Projection**: per-row/per-column foreground counts
//! 3. **Locating**: bounding rectangle of the answer grid, header/footer excluded
//! 4. **Splitting**: valley search for the seam between the answer columns
//!
//! Every stage is deterministic for a given input; nothing here suspends or
//! touches the network.

pub mod locate;
pub mod projection;
pub mod split;
pub mod threshold;

pub use locate::{Region, locate_region};
pub use split::{Block, BlockSide, split_region};
pub use threshold::BinaryMap;

use image::RgbImage;

use crate::config::SegmentationConfig;
use crate::error::SheetResult;

/// Segment a source image into its left/right answer blocks.
///
/// Validates the configuration, locates the answer-grid region with the
/// configured strategy, and splits it at the detected column seam. Fails
/// with a structural error when no valid region or split exists; never
/// returns an empty block silently.
pub fn segment(image: &RgbImage, config: &SegmentationConfig) -> SheetResult<Vec<Block>> {
    config.validate()?;
    let region = locate_region(image, config)?;
    tracing::debug!(
        strategy = config.strategy.name(),
        x0 = region.x0,
        y0 = region.y0,
        x1 = region.x1,
        y1 = region.y1,
        "answer grid located"
    );
    split_region(image, &region, config)
}
