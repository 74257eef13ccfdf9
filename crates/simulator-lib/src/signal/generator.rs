//! Load signal generation
//!
//! Produces the simulated concurrent-user count for a given elapsed time.
//! The deterministic base level is exactly periodic; noise and bursts are
//! drawn from the injected random source on every call.

use super::phase::{CyclePhase, PhasePosition};
use crate::config::{ConfigError, SignalConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound of the multiplicative noise factor
pub const NOISE_MIN: f64 = 0.88;

/// Upper bound of the multiplicative noise factor
pub const NOISE_MAX: f64 = 1.12;

/// Most recent random traffic spike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstEvent {
    /// Elapsed simulation time at which the burst fired
    pub elapsed_secs: f64,
    /// Load emitted on the burst tick
    pub users: u32,
}

/// One draw of the signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    pub phase: CyclePhase,
    pub base_level: f64,
    pub noise_factor: f64,
    pub burst_applied: bool,
    pub users: u32,
}

/// Four-phase load signal generator
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: SignalConfig,
    last_burst: Option<BurstEvent>,
}

impl SignalGenerator {
    /// Create a generator from a validated configuration
    pub fn new(config: SignalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            last_burst: None,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn cycle_length(&self) -> Duration {
        self.config.cycle_length()
    }

    /// Upper clamp for emitted values
    ///
    /// Always uses the configured burst multiplier, so non-burst ticks share
    /// the same ceiling as burst ticks.
    pub fn ceiling(&self) -> u32 {
        (self.config.max_users as f64 * self.config.burst_multiplier).floor() as u32
    }

    /// Most recent burst, if any has fired yet
    pub fn last_burst(&self) -> Option<BurstEvent> {
        self.last_burst
    }

    /// Classify an elapsed time into its cycle phase
    pub fn phase_at(&self, elapsed: Duration) -> PhasePosition {
        PhasePosition::classify(&self.config, elapsed)
    }

    /// Deterministic, noise-free load for an elapsed time
    pub fn base_level(&self, elapsed: Duration) -> f64 {
        Self::level_for(&self.config, &self.phase_at(elapsed))
    }

    fn level_for(config: &SignalConfig, position: &PhasePosition) -> f64 {
        let peak = config.peak_base_level;
        let off = config.off_base_level;

        match position.phase {
            CyclePhase::RampUp => off + (peak - off) * position.progress,
            CyclePhase::PeakPlateau => peak,
            CyclePhase::RampDown => peak - (peak - off) * position.progress,
            CyclePhase::OffPlateau => off,
        }
    }

    /// Draw the load for the current tick
    ///
    /// Noise is drawn on every call. The burst draw only happens during the
    /// peak plateau; a successful burst is recorded as the latest event.
    pub fn sample<R: Rng + ?Sized>(&mut self, elapsed: Duration, rng: &mut R) -> SignalSample {
        let position = self.phase_at(elapsed);
        let base_level = Self::level_for(&self.config, &position);

        let noise_factor = rng.gen_range(NOISE_MIN..=NOISE_MAX);
        let noisy = base_level * noise_factor;

        let burst_applied = position.phase == CyclePhase::PeakPlateau
            && rng.gen::<f64>() < self.config.burst_probability;
        let multiplier = if burst_applied {
            self.config.burst_multiplier
        } else {
            1.0
        };

        let users = ((noisy * multiplier).round() as u32).clamp(self.config.min_users, self.ceiling());

        if burst_applied {
            self.last_burst = Some(BurstEvent {
                elapsed_secs: elapsed.as_secs_f64(),
                users,
            });
        }

        SignalSample {
            phase: position.phase,
            base_level,
            noise_factor,
            burst_applied,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPSILON: f64 = 1e-9;

    fn generator() -> SignalGenerator {
        SignalGenerator::new(SignalConfig::default()).unwrap()
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SignalConfig {
            ramp_duration: Duration::ZERO,
            ..SignalConfig::default()
        };
        assert!(SignalGenerator::new(config).is_err());
    }

    #[test]
    fn test_reference_base_levels() {
        let gen = generator();
        assert_eq!(gen.phase_at(secs(0)).phase, CyclePhase::RampUp);
        assert!((gen.base_level(secs(0)) - 10.0).abs() < EPSILON);
        assert!((gen.base_level(secs(300)) - 65.0).abs() < EPSILON);
        assert!((gen.base_level(secs(3600 + 150)) - 65.0).abs() < EPSILON);
        assert!((gen.base_level(secs(3900 + 150)) - 37.5).abs() < EPSILON);
        assert!((gen.base_level(secs(5000)) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_base_level_continuous_at_boundaries() {
        let gen = generator();
        let epsilon = Duration::from_micros(1);

        for boundary in [300, 3900, 4200, 7800] {
            let at = gen.base_level(secs(boundary));
            let before = gen.base_level(secs(boundary) - epsilon);
            assert!(
                (at - before).abs() < 1e-3,
                "discontinuity at {boundary}s: {before} -> {at}"
            );
        }
    }

    #[test]
    fn test_base_level_periodic() {
        let gen = generator();
        let cycle = gen.cycle_length();

        for t in (0..7800).step_by(37) {
            let now = gen.base_level(secs(t));
            let next = gen.base_level(secs(t) + cycle);
            let later = gen.base_level(secs(t) + cycle * 5);
            assert!((now - next).abs() < EPSILON, "t={t}");
            assert!((now - later).abs() < EPSILON, "t={t}");
        }
    }

    #[test]
    fn test_lowest_draw_applies_minimum_noise() {
        let mut gen = generator();
        // All-zero draws: noise hits its lower bound, burst roll is 0.0
        let mut rng = StepRng::new(0, 0);

        let sample = gen.sample(secs(5000), &mut rng);
        assert_eq!(sample.phase, CyclePhase::OffPlateau);
        assert!((sample.noise_factor - NOISE_MIN).abs() < EPSILON);
        assert!(!sample.burst_applied);
        // round(10 * 0.88) = 9
        assert_eq!(sample.users, 9);
    }

    #[test]
    fn test_burst_fires_during_peak() {
        let mut gen = generator();
        let mut rng = StepRng::new(0, 0);

        let sample = gen.sample(secs(2000), &mut rng);
        assert_eq!(sample.phase, CyclePhase::PeakPlateau);
        assert!(sample.burst_applied);
        // round(65 * 0.88 * 1.5) = round(85.8) = 86
        assert_eq!(sample.users, 86);

        let burst = gen.last_burst().unwrap();
        assert_eq!(burst.elapsed_secs, 2000.0);
        assert_eq!(burst.users, 86);
    }

    #[test]
    fn test_burst_never_fires_outside_peak() {
        let config = SignalConfig {
            burst_probability: 1.0,
            ..SignalConfig::default()
        };
        let mut gen = SignalGenerator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for t in (0..7800).step_by(13) {
            let sample = gen.sample(secs(t), &mut rng);
            assert_eq!(
                sample.burst_applied,
                sample.phase == CyclePhase::PeakPlateau,
                "t={t} phase={}",
                sample.phase
            );
        }
    }

    #[test]
    fn test_zero_probability_never_bursts() {
        let config = SignalConfig {
            burst_probability: 0.0,
            ..SignalConfig::default()
        };
        let mut gen = SignalGenerator::new(config).unwrap();
        let mut rng = StepRng::new(0, 0);

        let sample = gen.sample(secs(2000), &mut rng);
        assert!(!sample.burst_applied);
        assert!(gen.last_burst().is_none());
    }

    #[test]
    fn test_last_burst_persists_until_overwritten() {
        let config = SignalConfig {
            burst_probability: 1.0,
            ..SignalConfig::default()
        };
        let mut gen = SignalGenerator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        gen.sample(secs(1000), &mut rng);
        gen.sample(secs(5000), &mut rng);
        assert_eq!(gen.last_burst().unwrap().elapsed_secs, 1000.0);

        gen.sample(secs(1500), &mut rng);
        assert_eq!(gen.last_burst().unwrap().elapsed_secs, 1500.0);
    }

    #[test]
    fn test_values_within_bounds() {
        let config = SignalConfig {
            burst_probability: 0.5,
            ..SignalConfig::default()
        };
        let mut gen = SignalGenerator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let ceiling = gen.ceiling();
        assert_eq!(ceiling, 120);

        for t in 0..20_000u64 {
            let sample = gen.sample(secs(t), &mut rng);
            assert!(sample.users >= 5 && sample.users <= ceiling, "t={t}");
            assert!(sample.noise_factor >= NOISE_MIN && sample.noise_factor <= NOISE_MAX);
        }
    }

    #[test]
    fn test_clamps_to_min_and_ceiling() {
        let config = SignalConfig {
            peak_base_level: 500.0,
            off_base_level: 1.0,
            burst_probability: 1.0,
            ..SignalConfig::default()
        };
        let mut gen = SignalGenerator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(gen.sample(secs(2000), &mut rng).users, 120);
        assert_eq!(gen.sample(secs(5000), &mut rng).users, 5);
    }

    #[test]
    fn test_noise_redrawn_each_call() {
        let mut gen = generator();
        let mut rng = StdRng::seed_from_u64(99);

        let factors: Vec<f64> = (0..10)
            .map(|_| gen.sample(secs(5000), &mut rng).noise_factor)
            .collect();
        assert!(factors.windows(2).any(|w| w[0] != w[1]));
    }
}
