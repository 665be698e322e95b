//! Per-stage timing samples, percentile computation, and the four
//! bottleneck-detection rules from §4.8.

use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_TOTAL_TIME_THRESHOLD_MS: u64 = 1000;
const DOMINANT_STAGE_FRACTION: f64 = 0.70;
const SLOW_STAGE_FRACTION: f64 = 0.5;
const HIGH_MEMORY_DELTA_MB: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone)]
pub struct Bottleneck {
    pub kind: &'static str,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// min/avg/p50/p95/p99 over one stage's recorded samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Percentiles {
    pub min_ms: u64,
    pub avg_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

#[derive(Default)]
pub struct Profiler {
    stages: HashMap<String, Vec<Duration>>,
    total_searches: u64,
    cache_hits: u64,
    cache_misses: u64,
    memory_start_mb: u64,
    memory_peak_mb: u64,
}

impl Profiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage(&mut self, name: &str, duration: Duration) {
        self.stages.entry(name.to_string()).or_default().push(duration);
    }

    pub fn record_search(&mut self) {
        self.total_searches += 1;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn set_memory_bounds(&mut self, start_mb: u64, peak_mb: u64) {
        self.memory_start_mb = start_mb;
        self.memory_peak_mb = peak_mb;
    }

    #[must_use]
    pub fn total_searches(&self) -> u64 {
        self.total_searches
    }

    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentiles(&self, stage: &str) -> Option<Percentiles> {
        let samples = self.stages.get(stage)?;
        if samples.is_empty() {
            return None;
        }
        let mut ms: Vec<u64> = samples.iter().map(|d| d.as_millis() as u64).collect();
        ms.sort_unstable();
        let percentile = |p: f64| -> u64 {
            let idx = ((ms.len() as f64 - 1.0) * p).round() as usize;
            ms[idx.min(ms.len() - 1)]
        };
        let sum: u64 = ms.iter().sum();
        Some(Percentiles {
            min_ms: ms[0],
            avg_ms: sum / ms.len() as u64,
            p50_ms: percentile(0.50),
            p95_ms: percentile(0.95),
            p99_ms: percentile(0.99),
        })
    }

    fn total_elapsed_ms(&self) -> u64 {
        self.stages.values().flatten().map(|d| d.as_millis() as u64).sum()
    }

    /// Evaluate the four bottleneck rules over the samples recorded so
    /// far, using `threshold_ms` as the total-time baseline (default
    /// 1000ms per §4.8).
    #[must_use]
    pub fn detect_bottlenecks(&self, threshold_ms: Option<u64>) -> Vec<Bottleneck> {
        let threshold_ms = threshold_ms.unwrap_or(DEFAULT_TOTAL_TIME_THRESHOLD_MS);
        let total_ms = self.total_elapsed_ms();
        let mut bottlenecks = Vec::new();

        if total_ms > threshold_ms {
            bottlenecks.push(Bottleneck {
                kind: "total_time",
                severity: Severity::High,
                message: format!("total search time {total_ms}ms exceeds {threshold_ms}ms threshold"),
                recommendation: "narrow the query or raise max_results limits".to_string(),
            });
        }

        for (stage, samples) in &self.stages {
            let stage_ms: u64 = samples.iter().map(|d| d.as_millis() as u64).sum();
            if stage_ms as f64 > threshold_ms as f64 * SLOW_STAGE_FRACTION {
                bottlenecks.push(Bottleneck {
                    kind: "slow_stage",
                    severity: Severity::Medium,
                    message: format!("stage '{stage}' took {stage_ms}ms"),
                    recommendation: format!("profile '{stage}' for avoidable I/O or allocation"),
                });
            }
            if total_ms > 0 && stage_ms as f64 / total_ms as f64 >= DOMINANT_STAGE_FRACTION {
                bottlenecks.push(Bottleneck {
                    kind: "dominant_stage",
                    severity: Severity::High,
                    message: format!("stage '{stage}' accounts for {stage_ms}ms of {total_ms}ms total"),
                    recommendation: format!("parallelize or cache '{stage}'"),
                });
            }
        }

        if self.memory_peak_mb.saturating_sub(self.memory_start_mb) > HIGH_MEMORY_DELTA_MB {
            bottlenecks.push(Bottleneck {
                kind: "high_memory",
                severity: Severity::High,
                message: format!(
                    "memory grew from {}MB to {}MB during the search",
                    self.memory_start_mb, self.memory_peak_mb
                ),
                recommendation: "lower max_file_size or the fuzzy searcher's line budget".to_string(),
            });
        }

        bottlenecks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_total_time_over_threshold() {
        let mut profiler = Profiler::new();
        profiler.record_stage("search", Duration::from_millis(1500));
        let bottlenecks = profiler.detect_bottlenecks(None);
        assert!(bottlenecks.iter().any(|b| b.kind == "total_time"));
    }

    #[test]
    fn flags_dominant_stage() {
        let mut profiler = Profiler::new();
        profiler.record_stage("content_search", Duration::from_millis(900));
        profiler.record_stage("sort", Duration::from_millis(50));
        let bottlenecks = profiler.detect_bottlenecks(Some(1000));
        assert!(bottlenecks.iter().any(|b| b.kind == "dominant_stage"));
    }

    #[test]
    fn flags_high_memory_delta() {
        let mut profiler = Profiler::new();
        profiler.set_memory_bounds(100, 700);
        let bottlenecks = profiler.detect_bottlenecks(None);
        assert!(bottlenecks.iter().any(|b| b.kind == "high_memory"));
    }

    #[test]
    fn percentiles_over_samples() {
        let mut profiler = Profiler::new();
        for ms in [10, 20, 30, 40, 50] {
            profiler.record_stage("stage", Duration::from_millis(ms));
        }
        let p = profiler.percentiles("stage").unwrap();
        assert_eq!(p.min_ms, 10);
        assert_eq!(p.avg_ms, 30);
    }
}
