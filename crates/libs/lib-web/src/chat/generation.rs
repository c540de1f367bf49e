//! # Generation Proxy
//!
//! Turns a single prompt into a single aggregated response by consuming the
//! local generation backend (Ollama). The backend streams its output as
//! newline-delimited JSON fragments, each carrying an incremental `response`
//! piece; [`GenerationClient::generate`] buffers raw byte chunks, parses
//! complete lines, and concatenates the pieces in arrival order.
//!
//! Transport failures at any point (before or during streaming) surface as
//! `AppError::Proxy` with the underlying cause; no partial accumulator is
//! ever returned. Malformed fragment lines are skipped, not fatal.

use futures_util::StreamExt;
use lib_core::{AppError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for the streaming text-generation backend.
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GenerationClient {
    /// Build a client for the backend at `base_url` (e.g. `http://localhost:11434`).
    ///
    /// No overall request timeout is set: generations can legitimately run
    /// for minutes, and transport failures still surface promptly as proxy
    /// errors.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Generate a completion for `prompt`, aggregating the streamed fragments
    /// into one trimmed string.
    ///
    /// An empty (after trimming) prompt is rejected with a validation error
    /// before any network call.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("Prompt is required".to_string()));
        }

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| AppError::Proxy(format!("cannot reach generation backend: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Proxy(format!("generation backend returned an error: {}", e)))?;

        let mut aggregator = FragmentAggregator::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| AppError::Proxy(format!("stream read error: {}", e)))?;
            aggregator.push_chunk(&bytes);
        }

        Ok(aggregator.finish())
    }

    /// Non-streaming variant: one blocking request, complete `response` field
    /// extracted directly. Same validation and failure taxonomy as
    /// [`generate`](Self::generate).
    pub async fn generate_blocking(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("Prompt is required".to_string()));
        }

        let body: GenerateResponse = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| AppError::Proxy(format!("cannot reach generation backend: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Proxy(format!("generation backend returned an error: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Proxy(format!("invalid generation response: {}", e)))?;

        Ok(body.response.trim().to_string())
    }
}

/// Accumulates newline-delimited JSON fragments across arbitrary chunk
/// boundaries.
///
/// A fragment may span chunks, so incoming bytes are buffered until a newline
/// is observed; only complete lines are parsed. The aggregation is associative
/// over chunk boundaries: any partition of the same byte stream produces the
/// same final string.
struct FragmentAggregator {
    buffer: String,
    acc: String,
}

impl FragmentAggregator {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            acc: String::new(),
        }
    }

    fn push_chunk(&mut self, bytes: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        while let Some(line_end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=line_end).collect();
            self.consume_line(line.trim());
        }
    }

    fn consume_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(fragment) => {
                if let Some(piece) = fragment.get("response").and_then(|r| r.as_str()) {
                    self.acc.push_str(piece);
                }
            }
            Err(e) => {
                // malformed fragments are tolerated, not fatal
                debug!("skipping malformed generation fragment: {}", e);
            }
        }
    }

    /// Finalize at end-of-stream: a trailing fragment without a newline still
    /// counts, and the result is trimmed of surrounding whitespace.
    fn finish(mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        self.consume_line(rest.trim());
        self.acc.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(chunks: &[&[u8]]) -> String {
        let mut aggregator = FragmentAggregator::new();
        for chunk in chunks {
            aggregator.push_chunk(chunk);
        }
        aggregator.finish()
    }

    #[test]
    fn test_aggregates_fragments_in_arrival_order() {
        let result = aggregate(&[b"{\"response\":\"He\"}\n", b"{\"response\":\"llo\"}\n"]);
        assert_eq!(result, "Hello");
    }

    #[test]
    fn test_aggregation_is_associative_over_chunk_boundaries() {
        let stream = b"{\"response\":\"He\"}\n{\"response\":\"llo\"}\n{\"done\":true}\n";

        let whole = aggregate(&[stream]);

        // byte-by-byte
        let mut aggregator = FragmentAggregator::new();
        for byte in stream.iter() {
            aggregator.push_chunk(std::slice::from_ref(byte));
        }
        let bytewise = aggregator.finish();

        // split in the middle of a fragment
        let (left, right) = stream.split_at(11);
        let halves = aggregate(&[left, right]);

        assert_eq!(whole, "Hello");
        assert_eq!(bytewise, whole);
        assert_eq!(halves, whole);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let result = aggregate(&[b"{\"response\":\"a\"}\nNOTJSON\n{\"response\":\"b\"}\n"]);
        assert_eq!(result, "ab");
    }

    #[test]
    fn test_fragments_without_response_field_are_ignored() {
        let result = aggregate(&[
            b"{\"model\":\"llama3.2:1b\"}\n{\"response\":\"ok\"}\n{\"done\":true}\n",
        ]);
        assert_eq!(result, "ok");
    }

    #[test]
    fn test_result_is_trimmed() {
        let result = aggregate(&[b"{\"response\":\" hi \"}\n"]);
        assert_eq!(result, "hi");
    }

    #[test]
    fn test_trailing_fragment_without_newline_counts() {
        let result = aggregate(&[b"{\"response\":\"a\"}\n{\"response\":\"b\"}"]);
        assert_eq!(result, "ab");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_any_network_call() {
        // unroutable base URL: a network attempt would fail differently
        let client = GenerationClient::new("http://127.0.0.1:1", "llama3.2:1b");

        let result = client.generate("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = client.generate_blocking("").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_proxy_error() {
        let client = GenerationClient::new("http://127.0.0.1:1", "llama3.2:1b");

        let result = client.generate("hello").await;
        assert!(matches!(result, Err(AppError::Proxy(_))));
    }
}
