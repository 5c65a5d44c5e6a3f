//! # Configuration Module
//!
//! Configuration structures and validation for the segmentation and
//! analysis stages. Values are held explicitly and passed into the pipeline
//! at construction; the core never reads environment state on its own, so
//! both stages stay independently testable with synthetic inputs.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `h_start_frac` / `h_end_frac` | 0.20 / 0.95 | ROI rows for the profile locator |
//! | `skip_top_frac` / `skip_bottom_frac` | 0.05 / 0.05 | ROI band for the midpoint locator |
//! | `min_block_height` | 100 | Minimum content-run height in rows |
//! | `row_thresh_frac` | 0.05 | Content-row gate as a fraction of width |
//! | `col_thresh_frac` | 0.03 | Content-column gate as a fraction of run height |
//! | `row_gap` | 10 | Non-content rows that end a run |
//! | `block_size` / `c` | 15 / 10.0 | Adaptive-threshold window and bias |
//! | `window_size` | 20 | Valley-search window in columns |

use std::time::Duration;

use crate::error::{SheetError, SheetResult};

/// Region-locator strategy, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorStrategy {
    /// Projection-profile content detection with header/footer exclusion.
    #[default]
    Profile,
    /// External-contour bounding boxes filtered by area (legacy).
    Contour,
    /// Fixed ROI band, split at the exact midpoint without valley search.
    MidpointOnly,
}

impl LocatorStrategy {
    /// Parse a strategy name as accepted on the CLI.
    pub fn parse(name: &str) -> SheetResult<Self> {
        match name.to_lowercase().as_str() {
            "profile" => Ok(Self::Profile),
            "contour" => Ok(Self::Contour),
            "midpoint-only" | "midpoint" => Ok(Self::MidpointOnly),
            other => Err(SheetError::config(
                "strategy",
                format!("unknown strategy '{other}', use: profile, contour, midpoint-only"),
            )),
        }
    }

    /// Strategy name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Contour => "contour",
            Self::MidpointOnly => "midpoint-only",
        }
    }
}

/// Configuration for the segmentation stage.
///
/// Fraction fields are relative to the source image dimensions. Defaults
/// are tuned for hand-photographed two-column answer sheets.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Fraction of the image height where the profile locator starts.
    pub h_start_frac: f32,
    /// Fraction of the image height where the profile locator stops.
    pub h_end_frac: f32,
    /// Top fraction skipped by the midpoint locator.
    pub skip_top_frac: f32,
    /// Bottom fraction skipped by the midpoint locator.
    pub skip_bottom_frac: f32,
    /// Minimum height (rows) for a content run to count as the grid.
    pub min_block_height: u32,
    /// A row is content if its foreground count exceeds this fraction of the width.
    pub row_thresh_frac: f32,
    /// A column is content if its count exceeds this fraction of the run height.
    pub col_thresh_frac: f32,
    /// Runs of content rows are broken by more than this many blank rows.
    pub row_gap: u32,
    /// Adaptive-threshold neighborhood size. Odd, > 1.
    pub block_size: u32,
    /// Adaptive-threshold bias subtracted from the local mean.
    pub c: f32,
    /// Sliding-window width (columns) for the valley search.
    pub window_size: u32,
    /// Region-locator strategy.
    pub strategy: LocatorStrategy,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            h_start_frac: 0.2,
            h_end_frac: 0.95,
            skip_top_frac: 0.05,
            skip_bottom_frac: 0.05,
            min_block_height: 100,
            row_thresh_frac: 0.05,
            col_thresh_frac: 0.03,
            row_gap: 10,
            block_size: 15,
            c: 10.0,
            window_size: 20,
            strategy: LocatorStrategy::Profile,
        }
    }
}

impl SegmentationConfig {
    /// Validate the configuration parameters.
    pub fn validate(&self) -> SheetResult<()> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(SheetError::config(
                "block_size",
                "must be odd and greater than 1",
            ));
        }
        if !(0.0..1.0).contains(&self.h_start_frac) || self.h_end_frac > 1.0 {
            return Err(SheetError::config(
                "h_start_frac/h_end_frac",
                "fractions must lie in [0, 1]",
            ));
        }
        if self.h_start_frac >= self.h_end_frac {
            return Err(SheetError::config(
                "h_start_frac",
                "must be below h_end_frac",
            ));
        }
        if self.skip_top_frac + self.skip_bottom_frac >= 1.0 {
            return Err(SheetError::config(
                "skip_top_frac/skip_bottom_frac",
                "skipped fractions must leave a nonempty band",
            ));
        }
        if self.window_size == 0 {
            return Err(SheetError::config("window_size", "must be greater than 0"));
        }
        if self.min_block_height == 0 {
            return Err(SheetError::config(
                "min_block_height",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Configuration for the external vision-analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Base URL of the generative-language endpoint.
    pub endpoint: String,
    /// Model identifier appended to the endpoint path.
    pub model: String,
    /// API key sent as a query parameter.
    pub api_key: String,
    /// Bounded per-call timeout enforced by the HTTP client.
    pub timeout: Duration,
    /// Questions per block, used to tell the model each block's range.
    pub questions_per_block: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            questions_per_block: 11,
        }
    }
}

impl AnalysisConfig {
    /// Build a configuration taking the API key from `GENAI_API_KEY`.
    ///
    /// The lookup happens once, here; the resulting value travels by value
    /// into the service client.
    pub fn from_env() -> SheetResult<Self> {
        let api_key = std::env::var("GENAI_API_KEY")
            .map_err(|_| SheetError::config("api_key", "GENAI_API_KEY is not set"))?;
        Ok(Self {
            api_key,
            ..Self::default()
        })
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> SheetResult<()> {
        if self.api_key.is_empty() {
            return Err(SheetError::config("api_key", "must not be empty"));
        }
        if self.questions_per_block == 0 {
            return Err(SheetError::config(
                "questions_per_block",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}
