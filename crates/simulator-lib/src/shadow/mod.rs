//! Resource shadowing
//!
//! Converts the simulated load into observable resource consumption: a
//! time-boxed CPU burn proportional to the load and a pool of held memory
//! blocks that tracks a load-derived target with hysteresis.

mod controller;
mod cpu;
mod memory;
mod stats;

pub use controller::{ShadowController, ShadowOutcome};
pub use cpu::{CpuBurner, SpinBurner};
pub use memory::{BlockAllocator, HeapAllocator, MemoryAdjustment, MemoryPool, BLOCK_SIZE_BYTES};
pub use stats::RunningStatistics;

#[cfg(test)]
pub(crate) mod testing {
    use super::{BlockAllocator, CpuBurner};
    use std::time::Duration;

    /// Burner that reports the budget as spent without spinning
    #[derive(Default)]
    pub(crate) struct InstantBurner {
        pub(crate) budgets: Vec<Duration>,
    }

    impl CpuBurner for InstantBurner {
        fn burn(&mut self, budget: Duration) -> Duration {
            self.budgets.push(budget);
            budget
        }
    }

    /// Allocator that fails once `remaining` blocks have been handed out
    pub(crate) struct LimitedAllocator {
        pub(crate) remaining: usize,
    }

    impl LimitedAllocator {
        pub(crate) fn new(remaining: usize) -> Self {
            Self { remaining }
        }
    }

    impl BlockAllocator for LimitedAllocator {
        fn allocate(&mut self, bytes: usize) -> Option<Box<[u8]>> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            // Blocks are counted, not measured; keep test allocations small
            Some(vec![0u8; bytes.min(16)].into_boxed_slice())
        }
    }
}
