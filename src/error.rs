//! # Error Handling
//!
//! Error types for the answer-sheet pipeline, split along the propagation
//! policy: segmentation errors are structural and abort the whole request,
//! while analysis and normalization errors are block-local and degrade into
//! a per-block entry of the final report.
//!
//! ## Error Classification
//!
//! - `RegionTooSmall`, `NoRegionFound`, `EmptyBlock`: fatal, no blocks can
//!   be produced or analyzed.
//! - `Analysis`, `InvalidResponse`: block-local, recorded in the report
//!   without aborting sibling blocks.
//! - `Config`, `Image`, `Io`, `Json`: infrastructure failures surfaced to
//!   the caller.

use std::{error::Error as StdError, fmt};

/// Base error type for the answer-sheet pipeline.
#[derive(Debug)]
pub enum SheetError {
    /// The located content run is shorter than the configured minimum.
    RegionTooSmall { height: u32, min_height: u32 },
    /// No answer-grid region satisfied the locator's filters.
    NoRegionFound { strategy: &'static str, reason: String },
    /// Column splitting produced a zero-width side.
    EmptyBlock { side: &'static str },
    /// A single block's external analysis call failed.
    Analysis {
        block_id: u32,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    /// A block's raw result failed schema validation.
    InvalidResponse { block_id: u32, reason: String },
    /// Configuration validation errors.
    Config { field: String, reason: String },
    /// Image decoding/encoding errors.
    Image { operation: String, source: image::ImageError },
    /// I/O errors.
    Io { operation: String, source: std::io::Error },
    /// JSON (de)serialization errors outside the per-block path.
    Json { operation: String, source: serde_json::Error },
}

impl SheetError {
    /// Create a region-too-small error.
    pub fn region_too_small(height: u32, min_height: u32) -> Self {
        Self::RegionTooSmall { height, min_height }
    }

    /// Create a no-region-found error for the given strategy.
    pub fn no_region(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::NoRegionFound {
            strategy,
            reason: reason.into(),
        }
    }

    /// Create an empty-block error for the given side.
    pub fn empty_block(side: &'static str) -> Self {
        Self::EmptyBlock { side }
    }

    /// Create an analysis error without an underlying source.
    pub fn analysis(block_id: u32, reason: impl Into<String>) -> Self {
        Self::Analysis {
            block_id,
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an analysis error wrapping an underlying transport error.
    pub fn analysis_with(
        block_id: u32,
        reason: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Analysis {
            block_id,
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-response error.
    pub fn invalid_response(block_id: u32, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            block_id,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an image processing error.
    pub fn image(operation: impl Into<String>, source: image::ImageError) -> Self {
        Self::Image {
            operation: operation.into(),
            source,
        }
    }

    /// Create an I/O error.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Get the error category as a string.
    pub fn category(&self) -> &'static str {
        match self {
            Self::RegionTooSmall { .. } => "region_too_small",
            Self::NoRegionFound { .. } => "no_region_found",
            Self::EmptyBlock { .. } => "empty_block",
            Self::Analysis { .. } => "analysis",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Config { .. } => "config",
            Self::Image { .. } => "image",
            Self::Io { .. } => "io",
            Self::Json { .. } => "json",
        }
    }

    /// Whether this error aborts the whole request.
    ///
    /// Segmentation errors are fatal: without a located region and two
    /// nonempty blocks there is nothing to analyze. Analysis and
    /// normalization errors are block-local and belong in the report.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Analysis { .. } | Self::InvalidResponse { .. })
    }
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::RegionTooSmall { height, min_height } => {
                write!(
                    f,
                    "detected region is too small: {} rows (minimum {})",
                    height, min_height
                )
            }
            SheetError::NoRegionFound { strategy, reason } => {
                write!(f, "no answer-grid region found ({}): {}", strategy, reason)
            }
            SheetError::EmptyBlock { side } => {
                write!(f, "column split produced an empty {} block", side)
            }
            SheetError::Analysis {
                block_id, reason, ..
            } => {
                write!(f, "analysis of block {} failed: {}", block_id, reason)
            }
            SheetError::InvalidResponse { block_id, reason } => {
                write!(f, "invalid response for block {}: {}", block_id, reason)
            }
            SheetError::Config { field, reason } => {
                write!(f, "configuration error in '{}': {}", field, reason)
            }
            SheetError::Image { operation, source } => {
                write!(f, "image error during {}: {}", operation, source)
            }
            SheetError::Io { operation, source } => {
                write!(f, "I/O error during {}: {}", operation, source)
            }
            SheetError::Json { operation, source } => {
                write!(f, "JSON error during {}: {}", operation, source)
            }
        }
    }
}

impl StdError for SheetError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Analysis {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            Self::Image { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using the pipeline error type.
pub type SheetResult<T> = Result<T, SheetError>;

impl From<image::ImageError> for SheetError {
    fn from(error: image::ImageError) -> Self {
        Self::image("unknown", error)
    }
}

impl From<std::io::Error> for SheetError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            operation: "unknown".to_string(),
            source: error,
        }
    }
}
