//! Simulation tick loop
//!
//! Drives a [`Simulator`] on a fixed interval. Each tick runs on the
//! blocking pool and hands the simulator back when it finishes, so ticks
//! never overlap and at most one CPU burn is active at a time. Readers
//! get snapshots through a watch channel and never touch the live pool.

use super::{Simulator, TickObservation};
use crate::health::{components, HealthRegistry};
use crate::models::StatusSnapshot;
use crate::observability::{SimulatorMetrics, StructuredLogger};
use crate::shadow::{BlockAllocator, CpuBurner, HeapAllocator, MemoryAdjustment, SpinBurner};
use crate::signal::CyclePhase;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Receiving end for status snapshots
pub type StatusReceiver = watch::Receiver<StatusSnapshot>;

/// Default tick interval of the reference deployment
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest interval the ticker accepts
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Simulator and its random source, moved onto the blocking pool for each tick
struct TickWorker<B: CpuBurner, A: BlockAllocator> {
    simulator: Simulator<B, A>,
    rng: StdRng,
}

/// Periodic driver for the simulator
pub struct SimulationLoop<B: CpuBurner = SpinBurner, A: BlockAllocator = HeapAllocator> {
    worker: Option<TickWorker<B, A>>,
    interval: Duration,
    status_tx: watch::Sender<StatusSnapshot>,
    metrics: SimulatorMetrics,
    health: HealthRegistry,
    logger: StructuredLogger,
    last_phase: Option<CyclePhase>,
    memory_degraded: bool,
    cpu_degraded: bool,
    ready: bool,
}

impl<B, A> SimulationLoop<B, A>
where
    B: CpuBurner + 'static,
    A: BlockAllocator + 'static,
{
    /// Create a loop; the receiver starts with the pre-tick snapshot
    pub fn new(
        simulator: Simulator<B, A>,
        rng: StdRng,
        interval: Duration,
        metrics: SimulatorMetrics,
        health: HealthRegistry,
        logger: StructuredLogger,
    ) -> (Self, StatusReceiver) {
        let (status_tx, status_rx) = watch::channel(simulator.snapshot());

        let sim_loop = Self {
            worker: Some(TickWorker { simulator, rng }),
            interval,
            status_tx,
            metrics,
            health,
            logger,
            last_phase: None,
            memory_degraded: false,
            cpu_degraded: false,
            ready: false,
        };

        (sim_loop, status_rx)
    }

    /// Run until a shutdown signal arrives or a tick task fails
    ///
    /// Shutdown is only observed between ticks; a tick in progress always
    /// completes, so the simulator is never left half-updated.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting simulation loop"
        );

        let mut ticker = interval(self.interval.max(MIN_TICK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let clock = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.run_tick(clock.elapsed()).await {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down simulation loop");
                    break;
                }
            }
        }
    }

    /// Execute one tick on the blocking pool and publish its results
    async fn run_tick(&mut self, elapsed: Duration) -> bool {
        let Some(mut worker) = self.worker.take() else {
            return false;
        };
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let observation = worker.simulator.tick(elapsed, &mut worker.rng);
            let snapshot = worker.simulator.snapshot();
            (worker, observation, snapshot)
        })
        .await;

        match result {
            Ok((worker, observation, snapshot)) => {
                self.worker = Some(worker);
                self.record(&observation, started.elapsed()).await;
                self.status_tx.send_replace(snapshot);
                true
            }
            Err(e) => {
                error!(error = %e, "Simulation tick task failed");
                self.health
                    .set_unhealthy(components::TICKER, format!("Tick task failed: {e}"))
                    .await;
                false
            }
        }
    }

    /// Update metrics, logs, and component health from a tick
    async fn record(&mut self, observation: &TickObservation, tick_duration: Duration) {
        let signal = &observation.signal;
        let shadow = &observation.shadow;

        self.metrics.record_signal(signal);
        self.metrics
            .record_memory(shadow.pool_mb, shadow.target_mb, shadow.memory);
        self.metrics.observe_cpu_burn(shadow.cpu_burn);
        self.metrics.observe_tick(tick_duration);

        if self.last_phase != Some(signal.phase) {
            self.logger
                .log_phase_change(self.last_phase, signal.phase, observation.elapsed_secs);
            self.last_phase = Some(signal.phase);
        }
        if signal.burst_applied {
            self.logger
                .log_burst(signal.users, signal.base_level, observation.elapsed_secs);
        }
        self.logger.log_tick(
            signal.users,
            signal.phase,
            shadow.cpu_burn,
            shadow.pool_mb,
            tick_duration,
        );

        match shadow.memory {
            MemoryAdjustment::Pressure { shortfall, .. } => {
                self.logger
                    .log_memory_pressure(shadow.pool_mb, shadow.target_mb, shortfall);
                self.health
                    .set_degraded(
                        components::MEMORY_SHADOW,
                        format!(
                            "Holding {} of {} MB after allocation failure",
                            shadow.pool_mb, shadow.target_mb
                        ),
                    )
                    .await;
                self.memory_degraded = true;
            }
            _ if self.memory_degraded => {
                self.health.set_healthy(components::MEMORY_SHADOW).await;
                self.memory_degraded = false;
            }
            _ => {}
        }

        if shadow.cpu_budget_capped != self.cpu_degraded {
            if shadow.cpu_budget_capped {
                self.health
                    .set_degraded(
                        components::CPU_SHADOW,
                        format!("CPU burn capped at {} ms", shadow.cpu_budget.as_millis()),
                    )
                    .await;
            } else {
                self.health.set_healthy(components::CPU_SHADOW).await;
            }
            self.cpu_degraded = shadow.cpu_budget_capped;
        }

        if !self.ready {
            self.health.set_ready(true).await;
            self.ready = true;
        }
    }
}

/// Builder for creating the simulation loop
pub struct SimulationLoopBuilder<B: CpuBurner = SpinBurner, A: BlockAllocator = HeapAllocator> {
    simulator: Option<Simulator<B, A>>,
    seed: Option<u64>,
    interval: Duration,
    metrics: Option<SimulatorMetrics>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl SimulationLoopBuilder<SpinBurner, HeapAllocator> {
    /// Create a new builder with the default 2 second interval
    pub fn new() -> Self {
        Self {
            simulator: None,
            seed: None,
            interval: DEFAULT_TICK_INTERVAL,
            metrics: None,
            health: None,
            logger: None,
        }
    }
}

impl Default for SimulationLoopBuilder<SpinBurner, HeapAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, A> SimulationLoopBuilder<B, A>
where
    B: CpuBurner + 'static,
    A: BlockAllocator + 'static,
{
    /// Set the simulator to drive
    pub fn simulator<B2: CpuBurner, A2: BlockAllocator>(
        self,
        simulator: Simulator<B2, A2>,
    ) -> SimulationLoopBuilder<B2, A2> {
        SimulationLoopBuilder {
            simulator: Some(simulator),
            seed: self.seed,
            interval: self.interval,
            metrics: self.metrics,
            health: self.health,
            logger: self.logger,
        }
    }

    /// Seed the random source; entropy is used when unset
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the tick interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn metrics(mut self, metrics: SimulatorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the simulation loop
    pub fn build(self) -> Result<(SimulationLoop<B, A>, StatusReceiver)> {
        let simulator = self
            .simulator
            .ok_or_else(|| anyhow::anyhow!("Simulator is required"))?;
        if self.interval.is_zero() {
            anyhow::bail!("Tick interval must be greater than zero");
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SimulationLoop::new(
            simulator,
            rng,
            self.interval,
            self.metrics.unwrap_or_default(),
            self.health.unwrap_or_default(),
            self.logger
                .unwrap_or_else(|| StructuredLogger::new("workload-simulator")),
        ))
    }
}
