//! # Sheetscan
//!
//! Segments a photographed multiple-choice answer sheet into its two answer
//! columns and fans the blocks out to an external vision-analysis service,
//! normalizing the returned markings into a canonical per-block report.
//!
//! ## Architecture
//!
//! The library is organized into three key modules:
//! - `segment`: synchronous, CPU-bound image segmentation (adaptive
//!   thresholding, projection profiles, region location, valley splitting)
//! - `analyze`: concurrent block analysis against the external service and
//!   response normalization
//! - `config`: explicit configuration passed in by value, so both stages
//!   are testable with synthetic inputs
//!
//! ## Pipeline
//!
//! raw image → threshold → projection profiles → region → left/right
//! blocks → concurrent service calls → normalized aggregate report.
//!
//! Segmentation failures (`RegionTooSmall`, `NoRegionFound`, `EmptyBlock`)
//! abort the request; per-block analysis failures degrade into error
//! entries of the report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetscan::{AnalysisConfig, GeminiClient, SegmentationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let image = image::open("sheet.jpeg")?.to_rgb8();
//! let service = GeminiClient::new(AnalysisConfig::from_env()?)?;
//! let report =
//!     sheetscan::process_sheet(&image, &SegmentationConfig::default(), service).await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

// Internal module imports
pub mod analyze;
pub mod config;
pub mod error;
pub mod segment;

/// Re-export error types for convenience
pub use error::{SheetError, SheetResult};

/// Re-export the configuration surface
pub use config::{AnalysisConfig, LocatorStrategy, SegmentationConfig};

/// Re-export the pipeline types used at the crate boundary
pub use analyze::{
    AggregateReport, AnalysisOrchestrator, BlockOutcome, BlockReport, GeminiClient,
    NormalizedAnswer, NormalizedResponse, QuestionKey, VisionAnalysis,
};
pub use segment::{Block, BlockSide, Region, segment};

use image::RgbImage;

/// Run the full pipeline: segment the sheet, then analyze every block.
///
/// This is the caller contract in one call: `segment()` failures abort
/// with a structural error, while per-block analysis failures are
/// represented inside the returned report.
pub async fn process_sheet<S: VisionAnalysis>(
    image: &RgbImage,
    config: &SegmentationConfig,
    service: S,
) -> SheetResult<AggregateReport> {
    let blocks = segment(image, config)?;
    let orchestrator = AnalysisOrchestrator::new(service);
    Ok(orchestrator.analyze(&blocks).await)
}
