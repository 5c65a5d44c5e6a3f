//! External vision-analysis service boundary.
//!
//! The service receives one losslessly encoded block image plus its ordinal
//! and returns the raw marking JSON. Everything behind the trait is an
//! external collaborator: the pipeline only depends on the call shape and
//! tolerates its failure modes (transport errors, non-JSON payloads,
//! empty-image rejections) per block.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{Value, json};

use crate::config::AnalysisConfig;
use crate::error::{SheetError, SheetResult};

/// Seam to the external vision-analysis capability.
///
/// Implementations take PNG bytes and the 1-based block ordinal and return
/// the service's raw JSON result. The per-call timeout is the
/// implementation's responsibility, not the orchestrator's.
#[async_trait]
pub trait VisionAnalysis: Send + Sync {
    async fn analyze_block(&self, png: Vec<u8>, block_id: u32) -> SheetResult<Value>;
}

#[async_trait]
impl<T: VisionAnalysis + ?Sized> VisionAnalysis for std::sync::Arc<T> {
    async fn analyze_block(&self, png: Vec<u8>, block_id: u32) -> SheetResult<Value> {
        (**self).analyze_block(png, block_id).await
    }
}

/// Default implementation calling the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    config: AnalysisConfig,
}

impl GeminiClient {
    /// Build a client with a bounded per-call timeout from the config.
    pub fn new(config: AnalysisConfig) -> SheetResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SheetError::config("timeout", e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Prompt asking for the marked alternative of each question in this
    /// block's range, as strict JSON.
    fn prompt_for(&self, block_id: u32) -> String {
        let per_block = self.config.questions_per_block;
        let start = (block_id - 1) * per_block + 1;
        let end = block_id * per_block;
        format!(
            "Analyze this image of a multiple-choice answer block \
             (questions {start} to {end}, alternatives A, B, C, D). \
             For every question identify which alternative is filled in. \
             Reply with strict JSON only: \
             {{\"questions_marked_processed\": {{\"<question>\": \"<alternative>\"}}, \
             \"is_valid_img\": <bool>}}. \
             Use null for unmarked questions and a comma-separated list for \
             duplicated markings. Count only clearly filled bubbles. \
             Set is_valid_img to false if the image is unreadable."
        )
    }

    fn request_body(&self, png: &[u8], block_id: u32) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": "image/png",
                            "data": general_purpose::STANDARD.encode(png),
                        }
                    },
                    { "text": self.prompt_for(block_id) }
                ]
            }],
            "generationConfig": {
                "response_mime_type": "application/json",
                "temperature": 0
            }
        })
    }
}

#[async_trait]
impl VisionAnalysis for GeminiClient {
    async fn analyze_block(&self, png: Vec<u8>, block_id: u32) -> SheetResult<Value> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.config.api_key
        );
        let body = self.request_body(&png, block_id);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetError::analysis_with(block_id, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::analysis(
                block_id,
                format!("service returned {status}"),
            ));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| SheetError::analysis_with(block_id, "non-JSON response body", e))?;

        // The model's answer is a JSON document inside the first text part.
        let text = envelope
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SheetError::invalid_response(block_id, "no text part in service response")
            })?;

        serde_json::from_str(text).map_err(|e| {
            SheetError::invalid_response(block_id, format!("model text is not JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> GeminiClient {
        GeminiClient::new(AnalysisConfig {
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            ..AnalysisConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn prompt_carries_the_block_question_range() {
        let client = client();
        let prompt = client.prompt_for(2);
        assert!(prompt.contains("questions 12 to 22"));
    }

    #[test]
    fn request_body_inlines_the_png() {
        let client = client();
        let body = client.request_body(&[1, 2, 3], 1);
        let data = body
            .pointer("/contents/0/parts/0/inline_data/data")
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!(data, general_purpose::STANDARD.encode([1u8, 2, 3]));
        assert_eq!(
            body.pointer("/generationConfig/response_mime_type")
                .and_then(Value::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn missing_api_key_is_rejected() {
        assert!(GeminiClient::new(AnalysisConfig::default()).is_err());
    }
}
