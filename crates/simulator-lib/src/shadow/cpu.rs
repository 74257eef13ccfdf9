//! CPU shadow

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Capability that consumes approximately the requested CPU time
pub trait CpuBurner: Send {
    /// Burn CPU for at most `budget`, returning the time actually spent
    fn burn(&mut self, budget: Duration) -> Duration;
}

/// Busy-loop burner bounded by wall-clock time
///
/// The loop is time-boxed rather than iteration-boxed, so the upper bound
/// holds regardless of how fast the host executes it.
#[derive(Debug, Clone)]
pub struct SpinBurner {
    /// Inner iterations between clock checks
    batch: u32,
}

impl SpinBurner {
    pub fn new() -> Self {
        Self { batch: 1_000 }
    }
}

impl Default for SpinBurner {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBurner for SpinBurner {
    fn burn(&mut self, budget: Duration) -> Duration {
        let start = Instant::now();
        if budget.is_zero() {
            return start.elapsed();
        }

        let batch = self.batch.max(1);
        let mut acc = 0.0f64;
        let mut i = 0u64;

        while start.elapsed() < budget {
            for _ in 0..batch {
                i = i.wrapping_add(1);
                acc += (i as f64).sqrt() * (i as f64).sin();
            }
            black_box(acc);
        }

        start.elapsed()
    }
}
