//! Response normalization.
//!
//! The service's marking payload arrives in one of two wire shapes: an
//! array of `{question, answer}` objects or a direct question→answer
//! mapping. Both decode through one untagged union and are adapted into a
//! single canonical form here — no call site ever branches on the shape.
//!
//! Question keys are parsed as integers with leading zeros stripped
//! (`"01"` → 1, `"00"` → 0); keys that fail to parse pass through as
//! strings rather than failing the block, since the payload comes from a
//! language model and occasional malformed keys are expected. String
//! answers are lower-cased; `null` and non-string values pass through
//! unchanged. Input order is preserved, never sorted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SheetError, SheetResult};

/// Raw per-block result as validated off the wire.
///
/// Unknown extra fields are ignored; the two required fields must be
/// present and well-shaped or the block fails with `InvalidResponse`.
#[derive(Debug, Deserialize)]
struct RawAnalysisResult {
    questions_marked_processed: MarkingPayload,
    is_valid_img: bool,
}

/// The two wire shapes of the marking payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarkingPayload {
    Entries(Vec<MarkingEntry>),
    Mapping(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
struct MarkingEntry {
    question: Value,
    #[serde(default)]
    answer: Value,
}

impl MarkingPayload {
    /// Adapt either shape into ordered `(question, answer)` pairs.
    fn into_pairs(self) -> Vec<(Value, Value)> {
        match self {
            Self::Entries(entries) => entries
                .into_iter()
                .map(|e| (e.question, e.answer))
                .collect(),
            Self::Mapping(map) => map
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
        }
    }
}

/// Canonical question key: an integer where the raw key parses as one,
/// otherwise the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuestionKey {
    Number(i64),
    Text(String),
}

/// One canonical per-question marking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedAnswer {
    pub question: QuestionKey,
    pub answer: Value,
}

/// Canonical per-block result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResponse {
    pub questions_marked_processed: Vec<NormalizedAnswer>,
    pub is_valid_img: bool,
}

/// Normalize one block's raw service result.
///
/// Validates the required fields and canonicalizes every pair, preserving
/// their order. Idempotent: normalizing an already-normalized result
/// yields the same mapping.
pub fn normalize(block_id: u32, raw: &Value) -> SheetResult<NormalizedResponse> {
    let result: RawAnalysisResult = serde_json::from_value(raw.clone())
        .map_err(|e| SheetError::invalid_response(block_id, e.to_string()))?;

    let questions_marked_processed = result
        .questions_marked_processed
        .into_pairs()
        .into_iter()
        .map(|(question, answer)| NormalizedAnswer {
            question: normalize_question(question),
            answer: normalize_answer(answer),
        })
        .collect();

    Ok(NormalizedResponse {
        questions_marked_processed,
        is_valid_img: result.is_valid_img,
    })
}

/// Canonicalize a raw question key.
fn normalize_question(raw: Value) -> QuestionKey {
    match raw {
        Value::String(s) => parse_question_key(&s),
        Value::Number(n) => match n.as_i64() {
            Some(n) => QuestionKey::Number(n),
            None => QuestionKey::Text(n.to_string()),
        },
        other => QuestionKey::Text(other.to_string()),
    }
}

/// Parse a question key with leading zeros stripped.
///
/// An all-zero key strips to the empty string and is treated as zero.
fn parse_question_key(raw: &str) -> QuestionKey {
    let stripped = raw.trim_start_matches('0');
    if stripped.is_empty() && !raw.is_empty() {
        return QuestionKey::Number(0);
    }
    match stripped.parse::<i64>() {
        Ok(n) => QuestionKey::Number(n),
        Err(_) => QuestionKey::Text(raw.to_string()),
    }
}

/// Lower-case string answers; pass everything else through unchanged.
fn normalize_answer(raw: Value) -> Value {
    match raw {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}
