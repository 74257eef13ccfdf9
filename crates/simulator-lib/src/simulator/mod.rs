//! Workload simulator core
//!
//! `Simulator` owns the signal generator and the shadow controller and
//! exposes a single `tick` operation. It holds no timer of its own; the
//! periodic driver lives in [`SimulationLoop`].

mod r#loop;

pub use r#loop::{SimulationLoop, SimulationLoopBuilder, StatusReceiver};

use crate::config::{ConfigError, ShadowConfig, SignalConfig};
use crate::models::StatusSnapshot;
use crate::shadow::{
    BlockAllocator, CpuBurner, HeapAllocator, ShadowController, ShadowOutcome, SpinBurner,
};
use crate::signal::{SignalGenerator, SignalSample};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything observed during one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickObservation {
    pub elapsed_secs: f64,
    pub signal: SignalSample,
    pub shadow: ShadowOutcome,
}

/// Signal generator and shadow controller driven together
pub struct Simulator<B: CpuBurner = SpinBurner, A: BlockAllocator = HeapAllocator> {
    generator: SignalGenerator,
    shadow: ShadowController<B, A>,
    started_at: i64,
    clock: Duration,
    last_sample: Option<SignalSample>,
}

impl Simulator<SpinBurner, HeapAllocator> {
    /// Build a simulator with the real CPU burner and heap-backed pool
    pub fn new(signal: SignalConfig, shadow: ShadowConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            SignalGenerator::new(signal)?,
            ShadowController::new(shadow)?,
        ))
    }
}

impl<B: CpuBurner, A: BlockAllocator> Simulator<B, A> {
    pub fn from_parts(generator: SignalGenerator, shadow: ShadowController<B, A>) -> Self {
        Self {
            generator,
            shadow,
            started_at: chrono::Utc::now().timestamp(),
            clock: Duration::ZERO,
            last_sample: None,
        }
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    pub fn shadow(&self) -> &ShadowController<B, A> {
        &self.shadow
    }

    /// Latest signal draw, `None` before the first tick
    pub fn last_sample(&self) -> Option<SignalSample> {
        self.last_sample
    }

    /// Elapsed simulation time of the latest tick
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Run one tick: draw the signal, then shadow it
    ///
    /// The simulation clock never moves backwards; an `elapsed` older than
    /// the previous tick is treated as the previous tick's time.
    pub fn tick<R: Rng + ?Sized>(&mut self, elapsed: Duration, rng: &mut R) -> TickObservation {
        self.clock = self.clock.max(elapsed);

        let signal = self.generator.sample(self.clock, rng);
        if signal.burst_applied {
            self.shadow.statistics_mut().record_burst();
        }
        let shadow = self.shadow.step(signal.users);
        self.last_sample = Some(signal);

        TickObservation {
            elapsed_secs: self.clock.as_secs_f64(),
            signal,
            shadow,
        }
    }

    /// Copy of the state exposed to status readers
    pub fn snapshot(&self) -> StatusSnapshot {
        let position = self.generator.phase_at(self.clock);
        let (phase, base_level) = match self.last_sample {
            Some(sample) => (sample.phase, sample.base_level),
            None => (position.phase, self.generator.base_level(self.clock)),
        };
        let last_burst = self.generator.last_burst();

        StatusSnapshot {
            started_at: self.started_at,
            updated_at: chrono::Utc::now().timestamp(),
            elapsed_secs: self.clock.as_secs_f64(),
            phase,
            base_level,
            current_users: self.last_sample.map(|s| s.users),
            ceiling_users: self.generator.ceiling(),
            memory_pool_mb: self.shadow.pool_mb(),
            memory_target_mb: self.shadow.target_mb(),
            last_burst,
            last_burst_at: last_burst.map(|b| self.started_at + b.elapsed_secs as i64),
            statistics: self.shadow.statistics().clone(),
            signal: self.generator.config().clone(),
            shadow: self.shadow.config().clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shadow::testing::{InstantBurner, LimitedAllocator};
    use crate::signal::CyclePhase;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) fn test_simulator(
        signal: SignalConfig,
    ) -> Simulator<InstantBurner, LimitedAllocator> {
        Simulator::from_parts(
            SignalGenerator::new(signal).unwrap(),
            ShadowController::with_parts(
                ShadowConfig::default(),
                InstantBurner::default(),
                LimitedAllocator::new(10_000),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let signal = SignalConfig {
            min_users: 100,
            ..SignalConfig::default()
        };
        assert!(Simulator::new(signal, ShadowConfig::default()).is_err());
    }

    #[test]
    fn test_snapshot_before_first_tick() {
        let sim = test_simulator(SignalConfig::default());
        let snapshot = sim.snapshot();

        assert_eq!(snapshot.current_users, None);
        assert_eq!(snapshot.phase, CyclePhase::RampUp);
        assert_eq!(snapshot.base_level, 10.0);
        assert_eq!(snapshot.statistics.ticks, 0);
        assert_eq!(snapshot.last_burst, None);
        assert_eq!(snapshot.ceiling_users, 120);
    }

    #[test]
    fn test_tick_feeds_signal_into_shadow() {
        let mut sim = test_simulator(SignalConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        let obs = sim.tick(Duration::from_secs(5000), &mut rng);
        assert_eq!(obs.signal.phase, CyclePhase::OffPlateau);
        assert_eq!(
            obs.shadow.target_mb,
            (f64::from(obs.signal.users) * 0.5).round() as usize
        );
        assert_eq!(obs.shadow.pool_mb, obs.shadow.target_mb);

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.current_users, Some(obs.signal.users));
        assert_eq!(snapshot.memory_pool_mb, obs.shadow.pool_mb);
        assert_eq!(snapshot.statistics.ticks, 1);
        assert_eq!(
            snapshot.statistics.cumulative_requests,
            u64::from(obs.signal.users)
        );
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut sim = test_simulator(SignalConfig::default());
        let mut rng = StdRng::seed_from_u64(2);

        sim.tick(Duration::from_secs(2000), &mut rng);
        let obs = sim.tick(Duration::from_secs(10), &mut rng);

        assert_eq!(obs.elapsed_secs, 2000.0);
        assert_eq!(obs.signal.phase, CyclePhase::PeakPlateau);
        assert_eq!(sim.clock(), Duration::from_secs(2000));
    }

    #[test]
    fn test_bursts_counted_and_exposed() {
        let signal = SignalConfig {
            burst_probability: 1.0,
            ..SignalConfig::default()
        };
        let mut sim = test_simulator(signal);
        let mut rng = StdRng::seed_from_u64(3);

        sim.tick(Duration::from_secs(1000), &mut rng);
        sim.tick(Duration::from_secs(1002), &mut rng);
        sim.tick(Duration::from_secs(5000), &mut rng);

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.statistics.bursts, 2);
        let burst = snapshot.last_burst.unwrap();
        assert_eq!(burst.elapsed_secs, 1002.0);
        assert_eq!(snapshot.last_burst_at, Some(snapshot.started_at + 1002));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = |seed| {
            let mut sim = test_simulator(SignalConfig::default());
            let mut rng = StdRng::seed_from_u64(seed);
            (0..200u64)
                .map(|t| sim.tick(Duration::from_secs(t * 40), &mut rng).signal.users)
                .collect::<Vec<_>>()
        };

        assert_eq!(run(17), run(17));
    }

    #[test]
    fn test_load_within_bounds_across_cycles() {
        let signal = SignalConfig {
            burst_probability: 0.3,
            ..SignalConfig::default()
        };
        let mut sim = test_simulator(signal);
        let mut rng = StdRng::seed_from_u64(4);

        for t in (0..3 * 7800u64).step_by(7) {
            let obs = sim.tick(Duration::from_secs(t), &mut rng);
            assert!((5..=120).contains(&obs.signal.users), "t={t}");
        }
    }
}
