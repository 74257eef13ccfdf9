//! Simulator configuration
//!
//! Every field can be set through a `SIM_`-prefixed environment variable
//! (for example `SIM_PEAK_DURATION_SECS=1800`). Unset fields fall back to
//! the reference deployment values.

use anyhow::{Context, Result};
use serde::Deserialize;
use simulator_lib::{ShadowConfig, SignalConfig};
use std::time::Duration;

/// Simulator process configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for health/metrics/status
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Fixed seed for reproducible noise and bursts
    #[serde(default)]
    pub rng_seed: Option<u64>,

    #[serde(default = "default_peak_duration_secs")]
    pub peak_duration_secs: u64,

    #[serde(default = "default_off_duration_secs")]
    pub off_duration_secs: u64,

    #[serde(default = "default_ramp_duration_secs")]
    pub ramp_duration_secs: u64,

    #[serde(default = "default_peak_base_level")]
    pub peak_base_level: f64,

    #[serde(default = "default_off_base_level")]
    pub off_base_level: f64,

    #[serde(default = "default_min_users")]
    pub min_users: u32,

    #[serde(default = "default_max_users")]
    pub max_users: u32,

    #[serde(default = "default_burst_probability")]
    pub burst_probability: f64,

    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f64,

    /// Memory held per simulated user, in MB
    #[serde(default = "default_per_user_mb")]
    pub per_user_mb: f64,

    /// Dead-band before the memory pool shrinks, in MB
    #[serde(default = "default_hysteresis_mb")]
    pub hysteresis_mb: usize,

    /// CPU burn per simulated user, in milliseconds
    #[serde(default = "default_cpu_cost_per_user_ms")]
    pub cpu_cost_per_user_ms: u64,

    /// Upper bound for a single CPU burn, in milliseconds
    #[serde(default = "default_max_cpu_burn_ms")]
    pub max_cpu_burn_ms: u64,
}

fn default_instance_name() -> String {
    std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "workload-simulator".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_tick_interval_ms() -> u64 {
    2000
}

fn default_peak_duration_secs() -> u64 {
    SignalConfig::default().peak_duration.as_secs()
}

fn default_off_duration_secs() -> u64 {
    SignalConfig::default().off_duration.as_secs()
}

fn default_ramp_duration_secs() -> u64 {
    SignalConfig::default().ramp_duration.as_secs()
}

fn default_peak_base_level() -> f64 {
    SignalConfig::default().peak_base_level
}

fn default_off_base_level() -> f64 {
    SignalConfig::default().off_base_level
}

fn default_min_users() -> u32 {
    SignalConfig::default().min_users
}

fn default_max_users() -> u32 {
    SignalConfig::default().max_users
}

fn default_burst_probability() -> f64 {
    SignalConfig::default().burst_probability
}

fn default_burst_multiplier() -> f64 {
    SignalConfig::default().burst_multiplier
}

fn default_per_user_mb() -> f64 {
    ShadowConfig::default().per_user_mb
}

fn default_hysteresis_mb() -> usize {
    ShadowConfig::default().hysteresis_mb
}

fn default_cpu_cost_per_user_ms() -> u64 {
    ShadowConfig::default().cpu_cost_per_user.as_millis() as u64
}

fn default_max_cpu_burn_ms() -> u64 {
    ShadowConfig::default().max_cpu_burn.as_millis() as u64
}

impl SimulatorConfig {
    /// Load configuration from `SIM_*` environment variables
    pub fn load() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("SIM").try_parsing(true))
            .build()?;

        Self::from_source(source)
    }

    /// Deserialize from an already-built configuration source
    pub fn from_source(source: config::Config) -> Result<Self> {
        let config: Self = source
            .try_deserialize()
            .context("Invalid simulator configuration")?;

        if config.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than zero");
        }
        config.signal_config().validate()?;
        config.shadow_config().validate()?;

        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            peak_duration: Duration::from_secs(self.peak_duration_secs),
            off_duration: Duration::from_secs(self.off_duration_secs),
            ramp_duration: Duration::from_secs(self.ramp_duration_secs),
            peak_base_level: self.peak_base_level,
            off_base_level: self.off_base_level,
            min_users: self.min_users,
            max_users: self.max_users,
            burst_probability: self.burst_probability,
            burst_multiplier: self.burst_multiplier,
        }
    }

    pub fn shadow_config(&self) -> ShadowConfig {
        ShadowConfig {
            per_user_mb: self.per_user_mb,
            hysteresis_mb: self.hysteresis_mb,
            cpu_cost_per_user: Duration::from_millis(self.cpu_cost_per_user_ms),
            max_cpu_burn: Duration::from_millis(self.max_cpu_burn_ms),
        }
    }
}
