//! One-way latency and jitter estimates from server timestamps.
//!
//! Only meaningful when both clocks agree, e.g. server and client on the same
//! machine; the numbers are diagnostic and never feed back into the protocol.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub latency_ms: f64,
    pub jitter_ms: f64,
}

/// Rolling window of recent latency samples
pub struct LatencyTracker {
    samples: VecDeque<LatencySample>,
    max_samples: usize,
    previous_latency: Option<f64>,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

impl LatencyTracker {
    /// Keeps the most recent `max_samples` samples.
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            previous_latency: None,
        }
    }

    /// Records a packet stamped at `sent_ms` and received at `received_ms`.
    pub fn record(&mut self, sent_ms: u64, received_ms: u64) -> LatencySample {
        let latency_ms = received_ms as f64 - sent_ms as f64;
        let jitter_ms = self
            .previous_latency
            .map(|prev| (latency_ms - prev).abs())
            .unwrap_or(0.0);
        self.previous_latency = Some(latency_ms);

        let sample = LatencySample {
            latency_ms,
            jitter_ms,
        };
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        sample
    }

    pub fn latest(&self) -> Option<LatencySample> {
        self.samples.back().copied()
    }

    /// Mean latency over the window, `None` before the first sample.
    pub fn average_latency(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|s| s.latency_ms).sum();
        Some(total / self.samples.len() as f64)
    }

    /// Mean jitter over the window, `None` before the first sample.
    pub fn average_jitter(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|s| s.jitter_ms).sum();
        Some(total / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_first_sample_has_no_jitter() {
        let mut tracker = LatencyTracker::default();
        let sample = tracker.record(1_000, 1_012);
        assert_approx_eq!(sample.latency_ms, 12.0);
        assert_approx_eq!(sample.jitter_ms, 0.0);
    }

    #[test]
    fn test_jitter_is_latency_delta() {
        let mut tracker = LatencyTracker::default();
        tracker.record(1_000, 1_010);
        let sample = tracker.record(2_000, 2_004);
        assert_approx_eq!(sample.latency_ms, 4.0);
        assert_approx_eq!(sample.jitter_ms, 6.0);
        assert_approx_eq!(tracker.average_latency().unwrap(), 7.0);
        assert_approx_eq!(tracker.average_jitter().unwrap(), 3.0);
    }

    #[test]
    fn test_clock_skew_gives_negative_latency() {
        let mut tracker = LatencyTracker::default();
        let sample = tracker.record(5_000, 4_990);
        assert_approx_eq!(sample.latency_ms, -10.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut tracker = LatencyTracker::new(3);
        for i in 0..10 {
            tracker.record(0, i * 10);
        }
        assert_eq!(tracker.len(), 3);
        assert_approx_eq!(tracker.average_latency().unwrap(), 80.0);
        assert_approx_eq!(tracker.latest().unwrap().latency_ms, 90.0);
    }

    #[test]
    fn test_empty_tracker() {
        let tracker = LatencyTracker::new(5);
        assert!(tracker.is_empty());
        assert!(tracker.average_latency().is_none());
        assert!(tracker.latest().is_none());
    }
}
