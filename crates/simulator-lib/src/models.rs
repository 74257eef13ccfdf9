//! Core data models shared by the simulator and its status readers

use crate::config::{ShadowConfig, SignalConfig};
use crate::shadow::RunningStatistics;
use crate::signal::{BurstEvent, CyclePhase};
use serde::{Deserialize, Serialize};

/// Read-only view of the simulator published after every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub started_at: i64,
    pub updated_at: i64,
    pub elapsed_secs: f64,
    pub phase: CyclePhase,
    pub base_level: f64,
    /// Latest simulated load, `None` until the first tick has run
    pub current_users: Option<u32>,
    pub ceiling_users: u32,
    pub memory_pool_mb: usize,
    pub memory_target_mb: usize,
    pub last_burst: Option<BurstEvent>,
    /// Wall-clock time of the last burst (unix seconds)
    pub last_burst_at: Option<i64>,
    pub statistics: RunningStatistics,
    pub signal: SignalConfig,
    pub shadow: ShadowConfig,
}

/// Serialize a `Duration` as fractional seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Serialize a `Duration` as fractional milliseconds
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "invalid duration: {millis}ms"
            )));
        }
        Ok(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
    }
}
