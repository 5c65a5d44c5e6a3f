use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sheetscan::{
    AnalysisConfig, GeminiClient, LocatorStrategy, SegmentationConfig, segment,
};

/// Analyze a photographed multiple-choice answer sheet:
/// locate the answer grid, split it into its two columns, and extract the
/// marked alternatives through the Gemini vision API.
#[derive(Parser, Debug)]
#[command(name = "sheetscan")]
#[command(about = "Extract marked answers from a photographed answer sheet")]
struct Args {
    /// Path to the sheet photo (JPEG/PNG)
    image: PathBuf,

    /// Region-locator strategy
    #[arg(short, long, default_value = "profile",
          help = "How to locate the answer grid: profile, contour, midpoint-only")]
    strategy: String,

    /// Vision model identifier
    #[arg(short, long, default_value = "gemini-2.0-flash")]
    model: String,

    /// Per-call timeout (supports seconds, minutes)
    #[arg(short, long, default_value = "30s",
          help = "Timeout per analysis call: 30 (seconds), 30s, 2m")]
    timeout: String,

    /// Questions per block, used to tell the model each block's range
    #[arg(short, long, default_value_t = 11)]
    questions_per_block: u32,

    /// Write each segmented block as block_<id>.png into this directory
    #[arg(long, value_name = "DIR")]
    dump_blocks: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let seg_config = SegmentationConfig {
        strategy: LocatorStrategy::parse(&args.strategy)?,
        ..SegmentationConfig::default()
    };
    let analysis_config = AnalysisConfig {
        model: args.model,
        timeout: parse_timeout(&args.timeout)?,
        questions_per_block: args.questions_per_block,
        ..AnalysisConfig::from_env()?
    };

    let image = image::open(&args.image)?.to_rgb8();
    let blocks = segment(&image, &seg_config)?;

    if let Some(dir) = &args.dump_blocks {
        std::fs::create_dir_all(dir)?;
        for block in &blocks {
            let path = dir.join(format!("block_{}.png", block.block_id));
            block.image.save(&path)?;
            tracing::info!(block = block.block_id, path = %path.display(), "block saved");
        }
    }

    let service = GeminiClient::new(analysis_config)?;
    let orchestrator = sheetscan::AnalysisOrchestrator::new(service);
    let report = orchestrator.analyze(&blocks).await;

    let envelope = serde_json::json!({
        "status": "success",
        "blocks": report,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Parse a timeout string like "30", "30s", "2m" into a duration
fn parse_timeout(timeout: &str) -> Result<Duration> {
    if let Ok(seconds) = timeout.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let len = timeout.len();
    if len < 2 {
        return Err(anyhow::anyhow!("Invalid timeout format: {}", timeout));
    }

    let (num_str, unit) = timeout.split_at(len - 1);
    let num: u64 = num_str
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid number in timeout: {}", num_str))?;

    match unit {
        "s" => Ok(Duration::from_secs(num)),
        "m" => Ok(Duration::from_secs(num * 60)),
        _ => Err(anyhow::anyhow!(
            "Invalid timeout unit: {}. Use 's' for seconds, 'm' for minutes",
            unit
        )),
    }
}
