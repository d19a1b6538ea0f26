//! Event type definitions for inference throughput data
//!
//! `EventRecord` is what the engine keeps in per-GPU history. `InferenceSample`
//! is the JSON form producers send to the exporter.

use serde::{Deserialize, Serialize};

/// Timestamp in nanoseconds since UNIX epoch
pub type Timestamp = u64;

/// One inference event as retained in a GPU's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the inference completed
    pub timestamp: Timestamp,

    /// Prompt (input) tokens
    pub tokens_prompt: u64,

    /// Generated (output) tokens
    pub tokens_generated: u64,

    /// Model that served the request
    pub model_id: String,
}

impl EventRecord {
    pub fn new(
        timestamp: Timestamp,
        tokens_prompt: u64,
        tokens_generated: u64,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            tokens_prompt,
            tokens_generated,
            model_id: model_id.into(),
        }
    }

    /// Prompt plus generated tokens.
    pub fn total_tokens(&self) -> u64 {
        self.tokens_prompt.saturating_add(self.tokens_generated)
    }
}

fn default_model_id() -> String {
    "unknown".to_string()
}

/// Inference sample as received on the ingest stream (one JSON object per line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSample {
    pub gpu_uuid: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default)]
    pub tokens_prompt: u64,

    #[serde(default)]
    pub tokens_generated: u64,

    /// GPU model name used for cost/energy lookup. Without it cost and
    /// energy are not recomputed for this sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_sku: Option<String>,

    /// Event time; the receiver's clock is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ns: Option<Timestamp>,
}

impl InferenceSample {
    /// Decode one line of the ingest stream.
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_tokens() {
        let record = EventRecord::new(1_000, 120, 380, "llama-7b");
        assert_eq!(record.total_tokens(), 500);
    }

    #[test]
    fn test_total_tokens_saturates() {
        let record = EventRecord::new(0, u64::MAX, 1, "m");
        assert_eq!(record.total_tokens(), u64::MAX);
    }

    #[test]
    fn test_sample_decode_full() {
        let line = r#"{"gpu_uuid":"gpu-001","model_id":"gpt-3.5","tokens_prompt":50,"tokens_generated":200,"gpu_sku":"H100","timestamp_ns":1700000000000000000}"#;
        let sample = InferenceSample::from_json_line(line).unwrap();
        assert_eq!(sample.gpu_uuid, "gpu-001");
        assert_eq!(sample.model_id, "gpt-3.5");
        assert_eq!(sample.tokens_prompt, 50);
        assert_eq!(sample.tokens_generated, 200);
        assert_eq!(sample.gpu_sku.as_deref(), Some("H100"));
        assert_eq!(sample.timestamp_ns, Some(1_700_000_000_000_000_000));
    }

    #[test]
    fn test_sample_decode_defaults() {
        let sample = InferenceSample::from_json_line("  {\"gpu_uuid\":\"gpu-002\"}\n").unwrap();
        assert_eq!(sample.model_id, "unknown");
        assert_eq!(sample.tokens_prompt, 0);
        assert_eq!(sample.tokens_generated, 0);
        assert!(sample.gpu_sku.is_none());
        assert!(sample.timestamp_ns.is_none());
    }

    #[test]
    fn test_sample_decode_rejects_missing_gpu() {
        assert!(InferenceSample::from_json_line(r#"{"tokens_prompt":5}"#).is_err());
        assert!(InferenceSample::from_json_line("not json").is_err());
    }

    #[test]
    fn test_sample_rejects_negative_tokens() {
        let line = r#"{"gpu_uuid":"gpu-001","tokens_prompt":-5}"#;
        assert!(InferenceSample::from_json_line(line).is_err());
    }
}
