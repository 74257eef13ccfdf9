//! Resource shadow controller
//!
//! A reactive step executed once per tick: burn CPU proportionally to the
//! load, move the memory pool toward its target, update statistics.

use super::cpu::{CpuBurner, SpinBurner};
use super::memory::{BlockAllocator, HeapAllocator, MemoryAdjustment, MemoryPool};
use super::stats::RunningStatistics;
use crate::config::{ConfigError, ShadowConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a single controller step did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowOutcome {
    #[serde(rename = "cpu_budget_ms", with = "crate::models::duration_millis")]
    pub cpu_budget: Duration,
    /// True when the load-proportional budget was cut to `max_cpu_burn`
    pub cpu_budget_capped: bool,
    #[serde(rename = "cpu_burn_ms", with = "crate::models::duration_millis")]
    pub cpu_burn: Duration,
    pub target_mb: usize,
    pub pool_mb: usize,
    pub memory: MemoryAdjustment,
}

/// Keeps CPU burn and held memory tracking the simulated load
pub struct ShadowController<B: CpuBurner = SpinBurner, A: BlockAllocator = HeapAllocator> {
    config: ShadowConfig,
    burner: B,
    pool: MemoryPool<A>,
    stats: RunningStatistics,
    last_target_mb: usize,
}

impl ShadowController<SpinBurner, HeapAllocator> {
    pub fn new(config: ShadowConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, SpinBurner::new(), HeapAllocator)
    }
}

impl<B: CpuBurner, A: BlockAllocator> ShadowController<B, A> {
    /// Create a controller with custom burner and allocator
    pub fn with_parts(config: ShadowConfig, burner: B, allocator: A) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            burner,
            pool: MemoryPool::with_allocator(allocator),
            stats: RunningStatistics::new(),
            last_target_mb: 0,
        })
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn statistics(&self) -> &RunningStatistics {
        &self.stats
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut RunningStatistics {
        &mut self.stats
    }

    pub fn pool_mb(&self) -> usize {
        self.pool.size_mb()
    }

    /// Target of the most recent step
    pub fn target_mb(&self) -> usize {
        self.last_target_mb
    }

    /// Memory target for a load value
    pub fn target_for(&self, load: u32) -> usize {
        (f64::from(load) * self.config.per_user_mb).round() as usize
    }

    /// CPU budget for a load value, and whether the cap was applied
    pub fn cpu_budget_for(&self, load: u32) -> (Duration, bool) {
        match self.config.cpu_cost_per_user.checked_mul(load) {
            Some(budget) if budget <= self.config.max_cpu_burn => (budget, false),
            _ => (self.config.max_cpu_burn, true),
        }
    }

    /// Run one controller step for the given load
    pub fn step(&mut self, load: u32) -> ShadowOutcome {
        let (cpu_budget, cpu_budget_capped) = self.cpu_budget_for(load);
        let cpu_burn = self.burner.burn(cpu_budget);

        let target_mb = self.target_for(load);
        let memory = self.pool.adjust(target_mb, self.config.hysteresis_mb);
        self.last_target_mb = target_mb;
        let pool_mb = self.pool.size_mb();

        self.stats.record_tick(load);
        self.stats.record_cpu_burn(cpu_burn);
        self.stats.record_pool_size(pool_mb);
        if memory.is_pressure() {
            self.stats.record_pressure();
        }

        ShadowOutcome {
            cpu_budget,
            cpu_budget_capped,
            cpu_burn,
            target_mb,
            pool_mb,
            memory,
        }
    }
}
