//! Simulator configuration
//!
//! Both configuration structs are fixed at startup. Every generator and
//! controller is built from a validated configuration, so the tick path
//! never has to deal with degenerate parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration rejected at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositiveLevel { name: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    ZeroBound(&'static str),

    #[error("min_users ({min}) must not exceed max_users ({max})")]
    InvertedBounds { min: u32, max: u32 },

    #[error("burst_probability must be within [0, 1], got {0}")]
    BurstProbability(f64),

    #[error("burst_multiplier must be greater than 1, got {0}")]
    BurstMultiplier(f64),
}

/// Parameters of the four-phase load waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Length of the peak plateau
    #[serde(with = "crate::models::duration_secs")]
    pub peak_duration: Duration,
    /// Length of the off-peak plateau
    #[serde(with = "crate::models::duration_secs")]
    pub off_duration: Duration,
    /// Length of each ramp (applied to both transitions)
    #[serde(with = "crate::models::duration_secs")]
    pub ramp_duration: Duration,
    /// Base level held during the peak plateau
    pub peak_base_level: f64,
    /// Base level held during the off-peak plateau
    pub off_base_level: f64,
    /// Lower clamp for the emitted value
    pub min_users: u32,
    /// Upper clamp before the burst multiplier is applied
    pub max_users: u32,
    /// Per-tick burst probability, only evaluated during the peak plateau
    pub burst_probability: f64,
    /// Multiplier applied to the load when a burst fires
    pub burst_multiplier: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            peak_duration: Duration::from_secs(3600),
            off_duration: Duration::from_secs(3600),
            ramp_duration: Duration::from_secs(300),
            peak_base_level: 65.0,
            off_base_level: 10.0,
            min_users: 5,
            max_users: 80,
            burst_probability: 0.05,
            burst_multiplier: 1.5,
        }
    }
}

impl SignalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, duration) in [
            ("peak_duration", self.peak_duration),
            ("off_duration", self.off_duration),
            ("ramp_duration", self.ramp_duration),
        ] {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        for (name, value) in [
            ("peak_base_level", self.peak_base_level),
            ("off_base_level", self.off_base_level),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveLevel { name, value });
            }
        }

        if self.min_users == 0 {
            return Err(ConfigError::ZeroBound("min_users"));
        }
        if self.max_users == 0 {
            return Err(ConfigError::ZeroBound("max_users"));
        }
        if self.min_users > self.max_users {
            return Err(ConfigError::InvertedBounds {
                min: self.min_users,
                max: self.max_users,
            });
        }

        if !(0.0..=1.0).contains(&self.burst_probability) {
            return Err(ConfigError::BurstProbability(self.burst_probability));
        }
        if !self.burst_multiplier.is_finite() || self.burst_multiplier <= 1.0 {
            return Err(ConfigError::BurstMultiplier(self.burst_multiplier));
        }

        Ok(())
    }

    /// Total length of one ramp-up, peak, ramp-down, off-peak cycle
    pub fn cycle_length(&self) -> Duration {
        self.peak_duration + self.off_duration + self.ramp_duration * 2
    }
}

/// Parameters of the resource shadow controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Memory held per simulated user, in MB
    pub per_user_mb: f64,
    /// Dead-band above the target before the pool is shrunk, in MB
    pub hysteresis_mb: usize,
    /// CPU burn budget per simulated user
    #[serde(with = "crate::models::duration_millis")]
    pub cpu_cost_per_user: Duration,
    /// Upper bound for a single CPU burn
    #[serde(with = "crate::models::duration_millis")]
    pub max_cpu_burn: Duration,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            per_user_mb: 0.5,
            hysteresis_mb: 2,
            cpu_cost_per_user: Duration::from_millis(5),
            max_cpu_burn: Duration::from_millis(1500),
        }
    }
}

impl ShadowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.per_user_mb.is_finite() || self.per_user_mb <= 0.0 {
            return Err(ConfigError::NonPositiveLevel {
                name: "per_user_mb",
                value: self.per_user_mb,
            });
        }
        if self.max_cpu_burn.is_zero() {
            return Err(ConfigError::ZeroDuration("max_cpu_burn"));
        }
        Ok(())
    }
}
