//! Request statistics for the prediction service.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before old ones are dropped
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Counters shared by all request handlers
pub struct ServiceMetrics {
    predictions_served: AtomicU64,
    fraud_verdicts: AtomicU64,
    inference_failures: AtomicU64,
    rejected_inputs: AtomicU64,
    /// Inference latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

/// Latency percentiles in microseconds
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Snapshot returned by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub uptime_secs: u64,
    pub predictions_served: u64,
    pub fraud_verdicts: u64,
    pub inference_failures: u64,
    pub rejected_inputs: u64,
    pub latency: LatencyStats,
    pub probability_distribution: [u64; 10],
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            fraud_verdicts: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            rejected_inputs: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a rendered verdict
    pub fn record_prediction(&self, latency: Duration, fraud_probability: f64, is_fraud: bool) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if is_fraud {
            self.fraud_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = (fraud_probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_input(&self) {
        self.rejected_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn snapshot(&self) -> ServiceStats {
        ServiceStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            fraud_verdicts: self.fraud_verdicts.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            rejected_inputs: self.rejected_inputs.load(Ordering::Relaxed),
            latency: self.latency_stats(),
            probability_distribution: self
                .probability_buckets
                .read()
                .map(|b| *b)
                .unwrap_or_default(),
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let stats = self.snapshot();
        let fraud_rate = if stats.predictions_served > 0 {
            (stats.fraud_verdicts as f64 / stats.predictions_served as f64) * 100.0
        } else {
            0.0
        };

        info!(
            uptime_secs = stats.uptime_secs,
            predictions = stats.predictions_served,
            fraud_verdicts = stats.fraud_verdicts,
            fraud_rate = format!("{:.1}%", fraud_rate),
            inference_failures = stats.inference_failures,
            rejected_inputs = stats.rejected_inputs,
            "Service summary"
        );
        info!(
            mean_us = stats.latency.mean_us,
            p50_us = stats.latency.p50_us,
            p95_us = stats.latency.p95_us,
            p99_us = stats.latency.p99_us,
            "Inference latency"
        );

        let total: u64 = stats.probability_distribution.iter().sum();
        for (i, &count) in stats.probability_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
