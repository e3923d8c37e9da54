//! Link-condition emulation
//!
//! [`NetworkEmulator::transmit`] models one message crossing an impaired
//! link: a loss roll, a latency sleep with uniform jitter, and a
//! serialization delay proportional to message size. Both peers in a test
//! harness share one emulator per direction.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::trace;

use crate::core::rng::SimpleRng;

/// Average latency above which a link counts as degraded (ms)
pub const DEFAULT_DEGRADED_THRESHOLD_MS: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetConfig {
    pub latency_ms: u32,
    pub jitter_ms: u32,
    /// Drop probability, clamped to [0, 1]
    pub loss: f64,
    /// Bytes per second; 0 means unconstrained
    pub bandwidth: u32,
}

impl NetConfig {
    pub fn new(latency_ms: u32, jitter_ms: u32, loss: f64, bandwidth: u32) -> Self {
        Self {
            latency_ms,
            jitter_ms,
            loss: loss.clamp(0.0, 1.0),
            bandwidth,
        }
    }

    pub fn perfect() -> Self {
        Self::new(0, 0, 0.0, 0)
    }

    pub fn good() -> Self {
        Self::new(30, 10, 0.01, 1_000_000)
    }

    pub fn normal() -> Self {
        Self::new(80, 30, 0.03, 250_000)
    }

    pub fn poor() -> Self {
        Self::new(200, 80, 0.10, 64_000)
    }

    pub fn terrible() -> Self {
        Self::new(500, 200, 0.25, 16_000)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NetStats {
    pub sent: u64,
    pub lost: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    sum_delay_ms: u64,
    delivered: u64,
}

impl NetStats {
    pub fn average_delay_ms(&self) -> f64 {
        if self.delivered == 0 {
            0.0
        } else {
            self.sum_delay_ms as f64 / self.delivered as f64
        }
    }

    pub fn loss_ratio(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.lost as f64 / self.sent as f64
        }
    }
}

pub struct NetworkEmulator {
    config: NetConfig,
    rng: Mutex<SimpleRng>,
    stats: Mutex<NetStats>,
}

impl NetworkEmulator {
    pub fn new(config: NetConfig, seed: u32) -> Self {
        Self {
            config,
            rng: Mutex::new(SimpleRng::new(seed)),
            stats: Mutex::new(NetStats::default()),
        }
    }

    pub fn config(&self) -> NetConfig {
        self.config
    }

    pub fn stats(&self) -> NetStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Delay this message would experience, in ms (loss aside)
    fn delay_for(&self, size_bytes: usize) -> u64 {
        let jitter = if self.config.jitter_ms == 0 {
            0i64
        } else {
            let span = i64::from(self.config.jitter_ms);
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            i64::from(rng.next_range(2 * span as u32 + 1)) - span
        };
        let base = i64::from(self.config.latency_ms) + jitter;
        let serialization = if self.config.bandwidth == 0 {
            0
        } else {
            (size_bytes as u64 * 1000) / u64::from(self.config.bandwidth)
        };
        base.max(0) as u64 + serialization
    }

    fn roll_loss(&self) -> bool {
        if self.config.loss <= 0.0 {
            return false;
        }
        if self.config.loss >= 1.0 {
            return true;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.next_f64() < self.config.loss
    }

    /// Run one message through the link. Blocks for the emulated delay and
    /// returns whether the message survived.
    pub fn transmit(&self, size_bytes: usize) -> bool {
        {
            let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
            stats.sent += 1;
        }
        if self.roll_loss() {
            let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
            stats.lost += 1;
            trace!("dropped {} byte message", size_bytes);
            return false;
        }

        let delay = self.delay_for(size_bytes);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }

        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        if stats.delivered == 0 || delay < stats.min_delay_ms {
            stats.min_delay_ms = delay;
        }
        if delay > stats.max_delay_ms {
            stats.max_delay_ms = delay;
        }
        stats.sum_delay_ms += delay;
        stats.delivered += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_loss_is_clamped() {
        assert_eq!(NetConfig::new(0, 0, -0.5, 0).loss, 0.0);
        assert_eq!(NetConfig::new(0, 0, 7.0, 0).loss, 1.0);
    }

    #[test]
    fn test_perfect_link_delivers_instantly() {
        let emu = NetworkEmulator::new(NetConfig::perfect(), 9);
        let start = Instant::now();
        for _ in 0..100 {
            assert!(emu.transmit(1000));
        }
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(emu.stats().lost, 0);
    }

    #[test]
    fn test_total_loss_drops_everything() {
        let emu = NetworkEmulator::new(NetConfig::new(0, 0, 1.0, 0), 9);
        for _ in 0..20 {
            assert!(!emu.transmit(100));
        }
        let stats = emu.stats();
        assert_eq!(stats.sent, 20);
        assert_eq!(stats.lost, 20);
        assert_eq!(stats.loss_ratio(), 1.0);
    }

    #[test]
    fn test_latency_and_jitter_bound_the_delay() {
        let emu = NetworkEmulator::new(NetConfig::new(20, 10, 0.0, 0), 123);
        for _ in 0..10 {
            let start = Instant::now();
            assert!(emu.transmit(10));
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(10), "{:?}", elapsed);
            assert!(elapsed < Duration::from_millis(80), "{:?}", elapsed);
        }
        let stats = emu.stats();
        assert!(stats.min_delay_ms >= 10);
        assert!(stats.max_delay_ms <= 30);
    }

    #[test]
    fn test_bandwidth_adds_serialization_delay() {
        // 10_000 bytes at 100_000 B/s is 100 ms on the wire
        let emu = NetworkEmulator::new(NetConfig::new(0, 0, 0.0, 100_000), 5);
        let start = Instant::now();
        assert!(emu.transmit(10_000));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_partial_loss_rate_is_plausible() {
        let emu = NetworkEmulator::new(NetConfig::new(0, 0, 0.3, 0), 42);
        for _ in 0..500 {
            emu.transmit(10);
        }
        let ratio = emu.stats().loss_ratio();
        assert!((0.2..0.4).contains(&ratio), "loss ratio {}", ratio);
    }
}
