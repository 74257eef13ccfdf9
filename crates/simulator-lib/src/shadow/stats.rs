//! Running statistics for the shadow controller

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monotonic counters and peak trackers, reset only on restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistics {
    pub ticks: u64,
    /// Sum of the simulated load over all ticks
    pub cumulative_requests: u64,
    pub peak_load: u32,
    #[serde(rename = "peak_cpu_burn_ms", with = "crate::models::duration_millis")]
    pub peak_cpu_burn: Duration,
    pub peak_pool_mb: usize,
    pub bursts: u64,
    pub pressure_events: u64,
}

impl RunningStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one tick with its load
    pub fn record_tick(&mut self, load: u32) {
        self.ticks += 1;
        self.cumulative_requests += u64::from(load);
        self.peak_load = self.peak_load.max(load);
    }

    pub fn record_cpu_burn(&mut self, elapsed: Duration) {
        self.peak_cpu_burn = self.peak_cpu_burn.max(elapsed);
    }

    pub fn record_pool_size(&mut self, size_mb: usize) {
        self.peak_pool_mb = self.peak_pool_mb.max(size_mb);
    }

    pub fn record_burst(&mut self) {
        self.bursts += 1;
    }

    pub fn record_pressure(&mut self) {
        self.pressure_events += 1;
    }

    /// Average load per tick
    pub fn mean_load(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.cumulative_requests as f64 / self.ticks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_never_decrease() {
        let mut stats = RunningStatistics::new();
        stats.record_tick(40);
        stats.record_tick(10);
        stats.record_cpu_burn(Duration::from_millis(200));
        stats.record_cpu_burn(Duration::from_millis(50));
        stats.record_pool_size(20);
        stats.record_pool_size(5);

        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.cumulative_requests, 50);
        assert_eq!(stats.peak_load, 40);
        assert_eq!(stats.peak_cpu_burn, Duration::from_millis(200));
        assert_eq!(stats.peak_pool_mb, 20);
        assert_eq!(stats.mean_load(), 25.0);
    }

    #[test]
    fn test_mean_load_without_ticks() {
        assert_eq!(RunningStatistics::new().mean_load(), 0.0);
    }

    #[test]
    fn test_serializes_burn_in_millis() {
        let mut stats = RunningStatistics::new();
        stats.record_cpu_burn(Duration::from_millis(250));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["peak_cpu_burn_ms"], 250.0);
        assert!(json.get("peak_cpu_burn").is_none());
    }
}
