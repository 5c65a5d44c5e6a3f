//! Fan-out/fan-in analysis orchestration.
//!
//! One concurrent service call per block, joined before returning. The
//! futures are collected with `join_all`, so the report order follows the
//! block order no matter which call finishes first. A failing block is
//! captured as a value in its own report slot; it never unwinds across
//! task boundaries or aborts its siblings.

use std::io::Cursor;
use std::sync::Arc;

use futures_util::future::join_all;
use image::ImageFormat;
use serde::Serialize;
use tracing::{info, warn};

use super::normalize::{NormalizedResponse, normalize};
use super::service::VisionAnalysis;
use crate::error::{SheetError, SheetResult};
use crate::segment::Block;

/// Outcome of one block's analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockOutcome {
    /// Normalized per-question markings.
    #[serde(rename = "response")]
    Response(NormalizedResponse),
    /// Human-readable failure for this block only.
    #[serde(rename = "error")]
    Error(String),
}

/// One entry of the aggregate report, index-aligned with its block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub block: u32,
    #[serde(flatten)]
    pub outcome: BlockOutcome,
}

/// Final per-block report, ordered by block ordinal.
///
/// Always as long as the analyzed block sequence, regardless of per-block
/// failures. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateReport {
    pub blocks: Vec<BlockReport>,
}

impl AggregateReport {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Fans blocks out to the vision-analysis service and joins the results.
pub struct AnalysisOrchestrator<S: VisionAnalysis> {
    service: Arc<S>,
}

impl<S: VisionAnalysis> AnalysisOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self::from_arc(Arc::new(service))
    }

    /// Build from a shared service handle, for callers that keep their own
    /// reference to it.
    pub fn from_arc(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Analyze every block concurrently and collect an ordered report.
    ///
    /// An empty block sequence returns an empty report without touching
    /// the service.
    pub async fn analyze(&self, blocks: &[Block]) -> AggregateReport {
        if blocks.is_empty() {
            return AggregateReport { blocks: Vec::new() };
        }

        info!(count = blocks.len(), "dispatching blocks for analysis");
        let tasks = blocks.iter().map(|block| {
            let service = Arc::clone(&self.service);
            async move {
                let outcome = match analyze_block(service.as_ref(), block).await {
                    Ok(response) => BlockOutcome::Response(response),
                    Err(e) => {
                        warn!(block = block.block_id, error = %e, "block analysis failed");
                        BlockOutcome::Error(e.to_string())
                    }
                };
                BlockReport {
                    block: block.block_id,
                    outcome,
                }
            }
        });

        AggregateReport {
            blocks: join_all(tasks).await,
        }
    }
}

/// Encode, dispatch and normalize a single block.
async fn analyze_block<S: VisionAnalysis + ?Sized>(
    service: &S,
    block: &Block,
) -> SheetResult<NormalizedResponse> {
    if !block.is_nonempty() {
        return Err(SheetError::analysis(
            block.block_id,
            format!("{} block has no pixels", block.side.name()),
        ));
    }
    let png = encode_png(block)?;
    let raw = service.analyze_block(png, block.block_id).await?;
    normalize(block.block_id, &raw)
}

/// Encode a block's pixels as PNG (lossless, per the service contract).
fn encode_png(block: &Block) -> SheetResult<Vec<u8>> {
    let mut buf = Vec::new();
    block
        .image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| {
            SheetError::analysis(block.block_id, format!("PNG encoding failed: {e}"))
        })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{BlockSide, Region};
    use async_trait::async_trait;
    use image::RgbImage;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedService {
        calls: AtomicUsize,
        fail_block: Option<u32>,
    }

    impl ScriptedService {
        fn new(fail_block: Option<u32>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_block,
            }
        }
    }

    #[async_trait]
    impl VisionAnalysis for ScriptedService {
        async fn analyze_block(&self, _png: Vec<u8>, block_id: u32) -> SheetResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_block == Some(block_id) {
                return Err(SheetError::analysis(block_id, "simulated timeout"));
            }
            Ok(json!({
                "questions_marked_processed": {"1": "A"},
                "is_valid_img": true
            }))
        }
    }

    fn block(id: u32) -> Block {
        Block {
            side: if id % 2 == 1 {
                BlockSide::Left
            } else {
                BlockSide::Right
            },
            block_id: id,
            image: RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])),
            region: Region {
                x0: 0,
                y0: 0,
                x1: 4,
                y1: 4,
            },
        }
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let service = ScriptedService::new(None);
        let orchestrator = AnalysisOrchestrator::new(service);
        let report = orchestrator.analyze(&[]).await;
        assert!(report.is_empty());
        assert_eq!(orchestrator.service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let orchestrator = AnalysisOrchestrator::new(ScriptedService::new(Some(2)));
        let blocks = vec![block(1), block(2), block(3)];
        let report = orchestrator.analyze(&blocks).await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.blocks[0].block, 1);
        assert_eq!(report.blocks[1].block, 2);
        assert_eq!(report.blocks[2].block, 3);
        assert!(matches!(report.blocks[0].outcome, BlockOutcome::Response(_)));
        assert!(matches!(report.blocks[2].outcome, BlockOutcome::Response(_)));
        match &report.blocks[1].outcome {
            BlockOutcome::Error(msg) => assert!(msg.contains("simulated timeout")),
            other => panic!("expected an error entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_block_is_a_per_block_error() {
        let orchestrator = AnalysisOrchestrator::new(ScriptedService::new(None));
        let mut bad = block(1);
        bad.image = RgbImage::new(0, 0);
        let report = orchestrator.analyze(&[bad, block(2)]).await;

        assert_eq!(report.len(), 2);
        assert!(matches!(report.blocks[0].outcome, BlockOutcome::Error(_)));
        assert!(matches!(report.blocks[1].outcome, BlockOutcome::Response(_)));
        // The empty block never reached the service.
        assert_eq!(orchestrator.service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn report_serializes_with_the_wire_field_names() {
        let orchestrator = AnalysisOrchestrator::new(ScriptedService::new(Some(1)));
        let report = orchestrator.analyze(&[block(1)]).await;
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value[0]["block"], json!(1));
        assert!(value[0]["error"].is_string());
    }
}
