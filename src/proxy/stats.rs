//! Pipeline statistics tracking.
//!
//! Tracks detected requests, text sizes before and after compression,
//! pass-throughs, write-back failures and processing latencies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::interceptor::PassThroughReason;

const MAX_LATENCIES: usize = 1000;

/// Thread-safe pipeline statistics
#[derive(Debug, Default)]
pub struct ProxyStats {
    /// Requests whose schema was detected
    requests: AtomicU64,
    /// Responses whose schema was detected
    responses: AtomicU64,
    /// Located request text size before compression (UTF-8 bytes)
    original_bytes: AtomicU64,
    /// Located request text size after compression (UTF-8 bytes)
    compressed_bytes: AtomicU64,
    /// Events forwarded unchanged
    passthroughs: AtomicU64,
    /// Write-back failures
    failures: AtomicU64,
    /// Processing latencies (for percentile calculation)
    latencies: RwLock<Vec<Duration>>,
    /// Start time
    started_at: RwLock<Option<Instant>>,
}

impl ProxyStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: RwLock::new(Some(Instant::now())),
            ..Default::default()
        }
    }

    /// Record a request whose schema was detected
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a response whose schema was detected
    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record located request text before and after compression
    pub fn record_text(&self, original: usize, compressed: usize) {
        self.original_bytes
            .fetch_add(original as u64, Ordering::Relaxed);
        self.compressed_bytes
            .fetch_add(compressed as u64, Ordering::Relaxed);
    }

    /// Record an event forwarded unchanged
    pub fn record_passthrough(&self, reason: PassThroughReason) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
        if reason == PassThroughReason::WriteBackFailed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record processing time of one event
    pub fn record_latency(&self, latency: Duration) {
        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency);
            // Keep the most recent window for percentile calculation
            if latencies.len() > MAX_LATENCIES {
                latencies.remove(0);
            }
        }
    }

    /// Get detected request count
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Get detected response count
    pub fn response_count(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }

    /// Get total original text bytes
    pub fn total_original_bytes(&self) -> u64 {
        self.original_bytes.load(Ordering::Relaxed)
    }

    /// Get total compressed text bytes
    pub fn total_compressed_bytes(&self) -> u64 {
        self.compressed_bytes.load(Ordering::Relaxed)
    }

    /// Get pass-through count
    pub fn passthrough_count(&self) -> u64 {
        self.passthroughs.load(Ordering::Relaxed)
    }

    /// Get write-back failure count
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Get total bytes saved
    pub fn bytes_saved(&self) -> u64 {
        self.total_original_bytes()
            .saturating_sub(self.total_compressed_bytes())
    }

    /// Get compression ratio (0.0-1.0, lower is better)
    pub fn compression_ratio(&self) -> f64 {
        let original = self.total_original_bytes();
        let compressed = self.total_compressed_bytes();

        if original == 0 {
            1.0
        } else {
            compressed as f64 / original as f64
        }
    }

    /// Get savings percentage
    pub fn savings_percent(&self) -> f64 {
        (1.0 - self.compression_ratio()) * 100.0
    }

    /// Get p50 latency
    pub fn p50_latency(&self) -> Option<Duration> {
        self.percentile_latency(50)
    }

    /// Get p95 latency
    pub fn p95_latency(&self) -> Option<Duration> {
        self.percentile_latency(95)
    }

    /// Get p99 latency
    pub fn p99_latency(&self) -> Option<Duration> {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> Option<Duration> {
        let latencies = self.latencies.read().ok()?;
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        Some(sorted[idx])
    }

    /// Get uptime since creation or last reset
    pub fn uptime(&self) -> Duration {
        self.started_at
            .read()
            .ok()
            .and_then(|s| s.map(|start| start.elapsed()))
            .unwrap_or_default()
    }

    /// Get summary as a serializable struct
    pub fn summary(&self) -> MetricsSummary {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;

        MetricsSummary {
            request_count: self.request_count(),
            response_count: self.response_count(),
            total_original_bytes: self.total_original_bytes(),
            total_compressed_bytes: self.total_compressed_bytes(),
            bytes_saved: self.bytes_saved(),
            compression_ratio: self.compression_ratio(),
            savings_percent: self.savings_percent(),
            passthrough_count: self.passthrough_count(),
            failure_count: self.failure_count(),
            p50_latency_ms: self.p50_latency().map(ms),
            p95_latency_ms: self.p95_latency().map(ms),
            p99_latency_ms: self.p99_latency().map(ms),
            uptime_secs: self.uptime().as_secs(),
        }
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.responses.store(0, Ordering::Relaxed);
        self.original_bytes.store(0, Ordering::Relaxed);
        self.compressed_bytes.store(0, Ordering::Relaxed);
        self.passthroughs.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.clear();
        }

        if let Ok(mut started) = self.started_at.write() {
            *started = Some(Instant::now());
        }
    }
}

/// Metrics summary for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Requests whose schema was detected.
    pub request_count: u64,
    /// Responses whose schema was detected.
    pub response_count: u64,
    /// Request text bytes before compression.
    pub total_original_bytes: u64,
    /// Request text bytes after compression.
    pub total_compressed_bytes: u64,
    /// Text bytes saved by compression.
    pub bytes_saved: u64,
    /// Compressed over original bytes.
    pub compression_ratio: f64,
    /// Percentage of bytes saved.
    pub savings_percent: f64,
    /// Events forwarded unchanged.
    pub passthrough_count: u64,
    /// Write-back failures.
    pub failure_count: u64,
    /// 50th percentile processing time in milliseconds.
    pub p50_latency_ms: Option<f64>,
    /// 95th percentile processing time in milliseconds.
    pub p95_latency_ms: Option<f64>,
    /// 99th percentile processing time in milliseconds.
    pub p99_latency_ms: Option<f64>,
    /// Seconds since start or last reset.
    pub uptime_secs: u64,
}
