//! Signal Request Metrics
//!
//! Tracks, per (symbol, prompt) request:
//! - how many attempts the model call needed
//! - model latency of the successful attempt and of the whole request
//! - token usage reported by the provider

use std::time::{Duration, Instant};

/// Metrics for one structured signal request
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    /// Attempts used, including the successful one
    pub attempts: u32,

    /// Latency of the successful model call (milliseconds)
    pub llm_latency_ms: u64,

    /// Wall time of the whole request including backoff sleeps (milliseconds)
    pub total_latency_ms: u64,

    /// Model that answered
    pub model: Option<String>,

    /// Total tokens reported by the provider
    pub tokens_used: Option<u32>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_llm_latency(&mut self, duration: Duration) {
        self.llm_latency_ms = duration.as_millis() as u64;
    }

    pub fn set_total_latency(&mut self, duration: Duration) {
        self.total_latency_ms = duration.as_millis() as u64;
    }

    /// Number of failed attempts before success
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Report metrics to tracing logs
    pub fn report(&self, label: &str) {
        tracing::info!(
            "{} metrics: attempts={}, retries={}, llm={}ms, total={}ms, model={:?}, tokens={:?}",
            label,
            self.attempts,
            self.retries(),
            self.llm_latency_ms,
            self.total_latency_ms,
            self.model,
            self.tokens_used,
        );
    }
}

/// Timer helper for measuring operation latency
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}
