//! Request/response interception pipeline.
//!
//! Every event walks the same stages:
//!
//! ```text
//! detect schema ──> parse body ──> locate text ──> transform ──> write back
//!      │                │               │              │             │
//!   NoSchema       InvalidBody    TextNotFound     Unchanged   WriteBackFailed
//! ```
//!
//! A stage that cannot proceed ends the event as a pass-through: the
//! original bytes go back to the transport untouched, and nothing is
//! retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use super::stats::{MetricsSummary, ProxyStats};
use crate::codec::StegoEngine;
use crate::config::Config;
use crate::error::{Result, StegoError};
use crate::schema::{locate_request_text, locate_response_text, LocatedText, SchemaId, SchemaRegistry};

/// Which way an event travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client to LLM API
    Request,
    /// LLM API back to client
    Response,
}

/// Why an event was forwarded unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughReason {
    /// Compression is switched off
    Disabled,
    /// URL matches no registered schema
    NoSchema,
    /// Body is not a JSON document
    InvalidBody,
    /// Schema matched but the text field is absent
    TextNotFound,
    /// Transform produced identical text
    Unchanged,
    /// Rewritten text could not be stored back
    WriteBackFailed,
}

impl std::fmt::Display for PassThroughReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PassThroughReason::Disabled => "compression disabled",
            PassThroughReason::NoSchema => "no matching schema",
            PassThroughReason::InvalidBody => "body is not JSON",
            PassThroughReason::TextNotFound => "text field not found",
            PassThroughReason::Unchanged => "text unchanged",
            PassThroughReason::WriteBackFailed => "write-back failed",
        };
        write!(f, "{s}")
    }
}

/// What happened to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The text field was replaced
    Rewritten {
        /// Detected schema
        schema: SchemaId,
        /// Located text size in bytes
        original_len: usize,
        /// Replacement text size in bytes
        rewritten_len: usize,
    },
    /// Original bytes forwarded
    PassThrough {
        /// Reason
        reason: PassThroughReason,
    },
}

/// Bytes handed back to the transport.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// Body to forward
    pub body: Bytes,
    /// New `Content-Length` value
    pub content_length: usize,
    /// What happened
    pub outcome: Outcome,
}

impl RewriteResult {
    fn rewritten(body: Vec<u8>, schema: SchemaId, original_len: usize, rewritten_len: usize) -> Self {
        let body = Bytes::from(body);
        Self {
            content_length: body.len(),
            body,
            outcome: Outcome::Rewritten {
                schema,
                original_len,
                rewritten_len,
            },
        }
    }

    fn pass_through(body: Bytes, reason: PassThroughReason) -> Self {
        Self {
            content_length: body.len(),
            body,
            outcome: Outcome::PassThrough { reason },
        }
    }

    /// Check if the body was rewritten
    pub fn is_rewritten(&self) -> bool {
        matches!(self.outcome, Outcome::Rewritten { .. })
    }

    /// Pass-through reason, if any
    pub fn pass_through_reason(&self) -> Option<PassThroughReason> {
        match self.outcome {
            Outcome::PassThrough { reason } => Some(reason),
            Outcome::Rewritten { .. } => None,
        }
    }
}

/// One request or response moving through the pipeline.
///
/// The JSON document is parsed on first use and never shared with another
/// event.
#[derive(Debug)]
pub struct InterceptedMessage {
    direction: Direction,
    url: String,
    body: Bytes,
    schema: Option<SchemaId>,
    document: Option<Value>,
    located: Option<LocatedText>,
}

impl InterceptedMessage {
    /// Wrap raw event bytes
    pub fn new(direction: Direction, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            direction,
            url: url.into(),
            body: body.into(),
            schema: None,
            document: None,
            located: None,
        }
    }

    /// Event direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Originating URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Original bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Detected schema
    pub fn schema(&self) -> Option<SchemaId> {
        self.schema
    }

    /// Located text and its path
    pub fn located(&self) -> Option<&LocatedText> {
        self.located.as_ref()
    }

    /// Parse the body on first access
    pub fn document(&mut self) -> Result<&mut Value> {
        if self.document.is_none() {
            let parsed: Value = serde_json::from_slice(&self.body)
                .map_err(|e| StegoError::InvalidBody(e.to_string()))?;
            if !parsed.is_object() {
                return Err(StegoError::InvalidBody("top level is not an object".to_string()));
            }
            self.document = Some(parsed);
        }

        self.document
            .as_mut()
            .ok_or_else(|| StegoError::InvalidBody("document unavailable".to_string()))
    }

    fn locate(&mut self, schema: SchemaId) -> Result<Option<LocatedText>> {
        let direction = self.direction;
        let doc = self.document()?;
        let found = match direction {
            Direction::Request => locate_request_text(schema, doc),
            Direction::Response => locate_response_text(schema, doc),
        };
        self.located = found.clone();
        Ok(found)
    }

    fn into_body(self) -> Bytes {
        self.body
    }
}

/// Schema-aware rewriting of LLM API traffic.
#[derive(Debug)]
pub struct Interceptor {
    engine: Arc<StegoEngine>,
    registry: SchemaRegistry,
    stats: Arc<ProxyStats>,
    compression_enabled: AtomicBool,
    decompress_responses: AtomicBool,
}

impl Interceptor {
    /// Create with every built-in schema and compression on
    pub fn new(engine: Arc<StegoEngine>) -> Self {
        Self {
            engine,
            registry: SchemaRegistry::new(),
            stats: Arc::new(ProxyStats::new()),
            compression_enabled: AtomicBool::new(true),
            decompress_responses: AtomicBool::new(false),
        }
    }

    /// Build the engine, registry and switches from configuration
    pub fn from_config(config: &Config) -> Self {
        let engine = StegoEngine::from_config(&config.compression, &config.custom_rules);
        let interceptor = Self::new(Arc::new(engine))
            .with_registry(SchemaRegistry::from_config(&config.api_compat));
        interceptor.set_compression_enabled(config.compression.enabled);
        interceptor.set_decompress_responses(config.compression.decompress_responses);
        interceptor
    }

    /// Use a specific schema registry
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Rewrite a request body bound for `url`
    pub fn on_request(&self, url: &str, body: impl Into<Bytes>) -> RewriteResult {
        self.process(InterceptedMessage::new(Direction::Request, url, body))
    }

    /// Rewrite a response body for a request that was sent to `url`
    pub fn on_response(&self, url: &str, body: impl Into<Bytes>) -> RewriteResult {
        self.process(InterceptedMessage::new(Direction::Response, url, body))
    }

    /// Run one event through the pipeline
    pub fn process(&self, mut msg: InterceptedMessage) -> RewriteResult {
        let started = Instant::now();

        let result = match self.rewrite(&mut msg) {
            Ok(result) => result,
            Err(reason) => {
                self.stats.record_passthrough(reason);
                RewriteResult::pass_through(msg.into_body(), reason)
            },
        };

        self.stats.record_latency(started.elapsed());
        result
    }

    fn rewrite(&self, msg: &mut InterceptedMessage) -> std::result::Result<RewriteResult, PassThroughReason> {
        if !self.compression_enabled() {
            return Err(PassThroughReason::Disabled);
        }

        let Some(schema) = self.registry.detect(msg.url()) else {
            tracing::debug!("No schema for {}, passing through", msg.url());
            return Err(PassThroughReason::NoSchema);
        };
        msg.schema = Some(schema);

        match msg.direction() {
            Direction::Request => self.stats.record_request(),
            Direction::Response => self.stats.record_response(),
        }
        tracing::debug!("Detected {} {:?} for {}", schema, msg.direction(), msg.url());

        let located = match msg.locate(schema) {
            Ok(Some(located)) => located,
            Ok(None) => {
                tracing::warn!("No text field in {} {:?}, passing through", schema, msg.direction());
                return Err(PassThroughReason::TextNotFound);
            },
            Err(e) => {
                tracing::warn!("Unusable {} {:?} body: {}", schema, msg.direction(), e);
                return Err(PassThroughReason::InvalidBody);
            },
        };

        let transformed = match msg.direction() {
            Direction::Request => {
                let compressed = self.engine.compress(&located.text);
                self.stats.record_text(located.text.len(), compressed.len());
                compressed
            },
            Direction::Response if self.decompress_responses() => {
                self.engine.decompress(&located.text)
            },
            Direction::Response => self.engine.transform_response(&located.text),
        };

        if transformed == located.text {
            return Err(PassThroughReason::Unchanged);
        }

        let body = msg
            .document()
            .and_then(|doc| {
                located.path.set(doc, &transformed)?;
                Ok(serde_json::to_vec(&*doc)?)
            })
            .map_err(|e| {
                tracing::warn!("Write-back to {} failed: {}", located.path, e);
                PassThroughReason::WriteBackFailed
            })?;

        tracing::info!(
            "Rewrote {} {:?} text at {}: {} -> {} bytes",
            schema,
            msg.direction(),
            located.path,
            located.text.len(),
            transformed.len()
        );

        Ok(RewriteResult::rewritten(
            body,
            schema,
            located.text.len(),
            transformed.len(),
        ))
    }

    /// Turn compression on or off for both directions
    pub fn set_compression_enabled(&self, enabled: bool) {
        self.compression_enabled.store(enabled, Ordering::Relaxed);
        tracing::info!("Compression {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether compression is on
    pub fn compression_enabled(&self) -> bool {
        self.compression_enabled.load(Ordering::Relaxed)
    }

    /// Decompress response text instead of passing it through
    pub fn set_decompress_responses(&self, enabled: bool) {
        self.decompress_responses.store(enabled, Ordering::Relaxed);
    }

    /// Whether response text is decompressed
    pub fn decompress_responses(&self) -> bool {
        self.decompress_responses.load(Ordering::Relaxed)
    }

    /// Compression engine
    pub fn engine(&self) -> &Arc<StegoEngine> {
        &self.engine
    }

    /// Schema registry
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Shared statistics
    pub fn stats(&self) -> &Arc<ProxyStats> {
        &self.stats
    }

    /// Metrics snapshot
    pub fn metrics(&self) -> MetricsSummary {
        self.stats.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CustomRule, CustomRules};
    use serde_json::json;

    const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
    const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1/models/gemini-pro/generateContent";

    fn interceptor() -> Interceptor {
        Interceptor::new(Arc::new(StegoEngine::new()))
    }

    fn chat_body(content: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": content}
            ],
            "temperature": 0.2
        }))
        .unwrap()
    }

    #[test]
    fn test_request_rewritten() {
        let interceptor = interceptor();
        let result = interceptor.on_request(OPENAI_URL, chat_body("Write a function in Python"));

        assert!(result.is_rewritten());
        assert_eq!(result.content_length, result.body.len());

        let doc: Value = serde_json::from_slice(&result.body).unwrap();
        assert_eq!(doc["messages"][1]["content"], "WF: in PY");
        assert_eq!(doc["messages"][0]["content"], "You are a helpful assistant.");
        assert_eq!(doc["temperature"], 0.2);

        let metrics = interceptor.metrics();
        assert_eq!(metrics.request_count, 1);
        assert_eq!(metrics.total_original_bytes, 26);
        assert_eq!(metrics.total_compressed_bytes, 9);
    }

    #[test]
    fn test_key_order_preserved() {
        let interceptor = interceptor();
        let body = br#"{"zeta":1,"messages":[{"role":"user","content":"Explain how it works"}],"alpha":2}"#;
        let result = interceptor.on_request(OPENAI_URL, &body[..]);

        assert_eq!(
            std::str::from_utf8(&result.body).unwrap(),
            r#"{"zeta":1,"messages":[{"role":"user","content":"EH: it works"}],"alpha":2}"#
        );
    }

    #[test]
    fn test_unknown_url_passes_through() {
        let interceptor = interceptor();
        let body = chat_body("Write a function");
        let result = interceptor.on_request("https://example.com/api/data", body.clone());

        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::NoSchema));
        assert_eq!(&result.body[..], &body[..]);
        assert_eq!(interceptor.metrics().request_count, 0);
    }

    #[test]
    fn test_invalid_and_missing_text() {
        let interceptor = interceptor();

        let result = interceptor.on_request(OPENAI_URL, "not json");
        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::InvalidBody));
        assert_eq!(&result.body[..], b"not json");

        let no_user = br#"{"messages":[{"role":"system","content":"Write a function"}]}"#;
        let result = interceptor.on_request(OPENAI_URL, &no_user[..]);
        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::TextNotFound));
        assert_eq!(&result.body[..], &no_user[..]);
    }

    #[test]
    fn test_unchanged_text_keeps_original_bytes() {
        let interceptor = interceptor();
        let body = b"{ \"messages\": [ {\"role\": \"user\", \"content\": \"hello there\"} ] }";
        let result = interceptor.on_request(OPENAI_URL, &body[..]);

        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::Unchanged));
        assert_eq!(&result.body[..], &body[..]);
        assert_eq!(interceptor.metrics().total_original_bytes, 11);
    }

    #[test]
    fn test_disabled() {
        let interceptor = interceptor();
        interceptor.set_compression_enabled(false);

        let result = interceptor.on_request(OPENAI_URL, chat_body("Write a function"));
        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::Disabled));
        assert!(!interceptor.compression_enabled());
    }

    #[test]
    fn test_response_passthrough_by_default() {
        let interceptor = interceptor();
        let body = serde_json::to_vec(&json!({
            "choices": [{"message": {"role": "assistant", "content": "WF: done"}}]
        }))
        .unwrap();

        let result = interceptor.on_response(OPENAI_URL, body.clone());
        assert_eq!(result.pass_through_reason(), Some(PassThroughReason::Unchanged));
        assert_eq!(&result.body[..], &body[..]);
        assert_eq!(interceptor.metrics().response_count, 1);
    }

    #[test]
    fn test_response_decompression() {
        let interceptor = interceptor();
        interceptor.set_decompress_responses(true);

        let body = serde_json::to_vec(&json!({
            "candidates": [{"content": {"parts": [{"text": "WF: in RS"}]}}]
        }))
        .unwrap();

        let result = interceptor.on_response(GEMINI_URL, body);
        assert!(result.is_rewritten());
        let doc: Value = serde_json::from_slice(&result.body).unwrap();
        assert_eq!(
            doc["candidates"][0]["content"]["parts"][0]["text"],
            "Write a function in Rust"
        );
        assert_eq!(result.content_length, result.body.len());
    }

    #[test]
    fn test_concurrent_requests_during_reload() {
        let interceptor = Arc::new(interceptor());
        let prompt = "Write a function to parse JSON";

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let interceptor = Arc::clone(&interceptor);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let result = interceptor.on_request(OPENAI_URL, chat_body(prompt));
                        let doc: Value = serde_json::from_slice(&result.body).unwrap();
                        let text = doc["messages"][1]["content"].as_str().unwrap().to_string();
                        assert!(
                            text == "WF: to parse JSON" || text == "WF: to PJ",
                            "Unexpected text: {text}"
                        );
                    }
                })
            })
            .collect();

        for _ in 0..10 {
            interceptor
                .engine()
                .reload_dictionary(CustomRules {
                    rules: vec![CustomRule {
                        pattern: "parse JSON".to_string(),
                        replacement: "PJ".to_string(),
                    }],
                    dictionaries: vec![],
                })
                .unwrap();
        }

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(interceptor.metrics().request_count, 200);
    }
}
