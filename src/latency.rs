use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

const WINDOW_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencyStats {
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub count: usize,
}

/// Sliding window over the most recent inference latencies.
pub struct LatencyTracker {
    inference_latencies: VecDeque<u64>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            inference_latencies: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    pub fn record_inference(&mut self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        if self.inference_latencies.len() >= WINDOW_SIZE {
            self.inference_latencies.pop_front();
        }
        self.inference_latencies.push_back(us);
    }

    pub fn inference_stats(&self) -> LatencyStats {
        compute_stats(&self.inference_latencies)
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_stats(q: &VecDeque<u64>) -> LatencyStats {
    if q.is_empty() {
        return LatencyStats::default();
    }
    let mut sorted: Vec<u64> = q.iter().copied().collect();
    sorted.sort_unstable();
    let n = sorted.len();
    LatencyStats {
        p50_us: sorted[n * 50 / 100],
        p95_us: sorted[n * 95 / 100],
        p99_us: sorted[(n * 99 / 100).min(n - 1)],
        min_us: sorted[0],
        max_us: sorted[n - 1],
        count: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_capped() {
        let mut tracker = LatencyTracker::new();
        for _ in 0..(WINDOW_SIZE + 10) {
            tracker.record_inference(Instant::now());
        }
        assert_eq!(tracker.inference_stats().count, WINDOW_SIZE);
    }

    #[test]
    fn empty_window_reports_zero() {
        let stats = LatencyTracker::new().inference_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max_us, 0);
    }
}
