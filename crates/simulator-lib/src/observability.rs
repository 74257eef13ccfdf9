//! Observability infrastructure for the workload simulator
//!
//! Provides:
//! - Prometheus metrics (simulated users, phase, pool size, CPU burn, tick latency)
//! - Structured JSON logging with tracing

use crate::shadow::MemoryAdjustment;
use crate::signal::{CyclePhase, SignalSample};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_gauge,
    register_int_gauge_vec, Gauge, Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Histogram buckets for CPU burn and tick durations (in seconds)
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SimulatorMetricsInner> = OnceLock::new();

struct SimulatorMetricsInner {
    simulated_users: IntGauge,
    base_level: Gauge,
    phase: IntGaugeVec,
    ticks: IntCounter,
    bursts: IntCounter,
    memory_pressure_events: IntCounter,
    memory_pool_mb: IntGauge,
    memory_target_mb: IntGauge,
    cpu_burn_seconds: Histogram,
    tick_duration_seconds: Histogram,
}

impl SimulatorMetricsInner {
    fn new() -> Self {
        Self {
            simulated_users: register_int_gauge!(
                "workload_simulator_simulated_users",
                "Simulated concurrent users emitted on the latest tick"
            )
            .expect("Failed to register simulated_users"),

            base_level: register_gauge!(
                "workload_simulator_base_level",
                "Deterministic base level before noise and bursts"
            )
            .expect("Failed to register base_level"),

            phase: register_int_gauge_vec!(
                "workload_simulator_phase",
                "Current cycle phase (1 for the active phase, 0 otherwise)",
                &["phase"]
            )
            .expect("Failed to register phase"),

            ticks: register_int_counter!(
                "workload_simulator_ticks_total",
                "Total number of simulation ticks"
            )
            .expect("Failed to register ticks"),

            bursts: register_int_counter!(
                "workload_simulator_bursts_total",
                "Total number of random traffic bursts"
            )
            .expect("Failed to register bursts"),

            memory_pressure_events: register_int_counter!(
                "workload_simulator_memory_pressure_total",
                "Ticks on which memory pool growth stopped on allocation failure"
            )
            .expect("Failed to register memory_pressure_events"),

            memory_pool_mb: register_int_gauge!(
                "workload_simulator_memory_pool_megabytes",
                "Memory currently held by the shadow pool"
            )
            .expect("Failed to register memory_pool_mb"),

            memory_target_mb: register_int_gauge!(
                "workload_simulator_memory_target_megabytes",
                "Memory the shadow pool is converging toward"
            )
            .expect("Failed to register memory_target_mb"),

            cpu_burn_seconds: register_histogram!(
                "workload_simulator_cpu_burn_seconds",
                "Time spent in the CPU shadow burn per tick",
                DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register cpu_burn_seconds"),

            tick_duration_seconds: register_histogram!(
                "workload_simulator_tick_duration_seconds",
                "Wall-clock duration of a full simulation tick",
                DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register tick_duration_seconds"),
        }
    }
}

/// Simulator metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct SimulatorMetrics {
    _private: (),
}

impl Default for SimulatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SimulatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SimulatorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the signal drawn on a tick
    pub fn record_signal(&self, sample: &SignalSample) {
        let inner = self.inner();
        inner.simulated_users.set(i64::from(sample.users));
        inner.base_level.set(sample.base_level);
        for phase in CyclePhase::ALL {
            inner
                .phase
                .with_label_values(&[phase.as_str()])
                .set(i64::from(phase == sample.phase));
        }
        if sample.burst_applied {
            inner.bursts.inc();
        }
    }

    /// Record the shadow pool state after a tick
    pub fn record_memory(&self, pool_mb: usize, target_mb: usize, adjustment: MemoryAdjustment) {
        let inner = self.inner();
        inner.memory_pool_mb.set(pool_mb as i64);
        inner.memory_target_mb.set(target_mb as i64);
        if adjustment.is_pressure() {
            inner.memory_pressure_events.inc();
        }
    }

    pub fn observe_cpu_burn(&self, burn: Duration) {
        self.inner().cpu_burn_seconds.observe(burn.as_secs_f64());
    }

    /// Count a completed tick and its duration
    pub fn observe_tick(&self, duration: Duration) {
        let inner = self.inner();
        inner.ticks.inc();
        inner.tick_duration_seconds.observe(duration.as_secs_f64());
    }
}

/// Structured logger for simulator events
///
/// Provides consistent JSON-formatted logging for phase changes, bursts,
/// memory pressure, and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log simulator startup
    pub fn log_startup(&self, version: &str, cycle_length_secs: f64, tick_interval: Duration) {
        info!(
            event = "simulator_started",
            instance = %self.instance,
            version = %version,
            cycle_length_secs = cycle_length_secs,
            tick_interval_ms = tick_interval.as_millis() as u64,
            "Workload simulator started"
        );
    }

    /// Log simulator shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "simulator_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Workload simulator shutting down"
        );
    }

    pub fn log_phase_change(&self, from: Option<CyclePhase>, to: CyclePhase, elapsed_secs: f64) {
        info!(
            event = "phase_changed",
            instance = %self.instance,
            from = ?from.map(|p| p.as_str()),
            to = %to,
            elapsed_secs = elapsed_secs,
            "Load cycle entered a new phase"
        );
    }

    pub fn log_burst(&self, users: u32, base_level: f64, elapsed_secs: f64) {
        info!(
            event = "burst_triggered",
            instance = %self.instance,
            users = users,
            base_level = base_level,
            elapsed_secs = elapsed_secs,
            "Random traffic burst"
        );
    }

    /// Log a pool growth stopped by allocation failure
    pub fn log_memory_pressure(&self, pool_mb: usize, target_mb: usize, shortfall: usize) {
        warn!(
            event = "memory_pressure",
            instance = %self.instance,
            pool_mb = pool_mb,
            target_mb = target_mb,
            shortfall_mb = shortfall,
            "Memory pool growth stopped on allocation failure"
        );
    }

    pub fn log_tick(
        &self,
        users: u32,
        phase: CyclePhase,
        cpu_burn: Duration,
        pool_mb: usize,
        tick_duration: Duration,
    ) {
        debug!(
            event = "tick_completed",
            instance = %self.instance,
            users = users,
            phase = %phase,
            cpu_burn_ms = cpu_burn.as_millis() as u64,
            pool_mb = pool_mb,
            tick_ms = tick_duration.as_millis() as u64,
            "Simulation tick complete"
        );
    }
}
