//! Heartbeat latency monitor
//!
//! Keeps a sliding window of one-way heartbeat delays and flags the link as
//! degraded when the window average crosses a tunable threshold.

use std::collections::VecDeque;

use log::warn;

use crate::net::emulator::DEFAULT_DEGRADED_THRESHOLD_MS;

pub const LATENCY_WINDOW: usize = 10;

#[derive(Debug)]
pub struct LatencyMonitor {
    samples: VecDeque<f64>,
    threshold_ms: f64,
}

impl Default for LatencyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyMonitor {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(LATENCY_WINDOW),
            threshold_ms: DEFAULT_DEGRADED_THRESHOLD_MS,
        }
    }

    pub fn set_threshold_ms(&mut self, threshold_ms: f64) {
        self.threshold_ms = threshold_ms;
    }

    /// Record one heartbeat delay; the oldest sample falls out of the window.
    pub fn record(&mut self, delay_ms: f64) {
        if self.samples.len() == LATENCY_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(delay_ms);
        if self.is_degraded() {
            warn!(
                "link degraded: {:.0} ms average over last {} heartbeats",
                self.average_ms(),
                self.samples.len()
            );
        }
    }

    /// Mean over the current window; 0 with no samples yet
    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn is_degraded(&self) -> bool {
        !self.samples.is_empty() && self.average_ms() > self.threshold_ms
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_monitor_is_healthy() {
        let m = LatencyMonitor::new();
        assert_eq!(m.average_ms(), 0.0);
        assert!(!m.is_degraded());
    }

    #[test]
    fn test_window_keeps_last_ten() {
        let mut m = LatencyMonitor::new();
        // 15 samples 10, 20, .. 150; the window holds 60..150
        for i in 1..=15 {
            m.record((i * 10) as f64);
        }
        assert_eq!(m.sample_count(), LATENCY_WINDOW);
        assert_eq!(m.average_ms(), 105.0);
    }

    #[test]
    fn test_degraded_threshold_is_tunable() {
        let mut m = LatencyMonitor::new();
        for _ in 0..10 {
            m.record(150.0);
        }
        assert!(!m.is_degraded());
        m.set_threshold_ms(100.0);
        assert!(m.is_degraded());
    }

    #[test]
    fn test_recovery_as_fast_samples_displace_slow() {
        let mut m = LatencyMonitor::new();
        for _ in 0..10 {
            m.record(400.0);
        }
        assert!(m.is_degraded());
        for _ in 0..10 {
            m.record(20.0);
        }
        assert!(!m.is_degraded());
        assert_eq!(m.average_ms(), 20.0);
    }
}
