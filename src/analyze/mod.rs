//! # Block Analysis Pipeline
//!
//! Concurrent fan-out of segmented blocks to the external vision-analysis
//! service, and normalization of the raw per-question markings into the
//! canonical report.
//!
//! ## Architecture
//!
//! 1. **VisionAnalysis trait**: the external-service seam; one call per block
//! 2. **GeminiClient**: default HTTP implementation of that seam
//! 3. **AnalysisOrchestrator**: fan-out/fan-in with per-block failure isolation
//! 4. **Normalizer**: schema validation and canonical key/answer mapping
//!
//! The only suspension points in the whole pipeline are the service calls;
//! each concurrent task owns its block and writes only its own report slot,
//! so no locking is involved.

pub mod normalize;
pub mod orchestrator;
pub mod service;

pub use normalize::{NormalizedAnswer, NormalizedResponse, QuestionKey, normalize};
pub use orchestrator::{AggregateReport, AnalysisOrchestrator, BlockOutcome, BlockReport};
pub use service::{GeminiClient, VisionAnalysis};
