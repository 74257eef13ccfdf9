//! Cycle phase classification

use crate::config::SignalConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Position within the repeating load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePhase {
    RampUp,
    PeakPlateau,
    RampDown,
    OffPlateau,
}

impl CyclePhase {
    pub const ALL: [CyclePhase; 4] = [
        CyclePhase::RampUp,
        CyclePhase::PeakPlateau,
        CyclePhase::RampDown,
        CyclePhase::OffPlateau,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::RampUp => "ramp-up",
            CyclePhase::PeakPlateau => "peak-plateau",
            CyclePhase::RampDown => "ramp-down",
            CyclePhase::OffPlateau => "off-plateau",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified position within the cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePosition {
    pub phase: CyclePhase,
    /// Seconds since the start of the current cycle
    pub position_secs: f64,
    /// Progress through the current ramp in [0, 1]; 0 on plateaus
    pub progress: f64,
}

impl PhasePosition {
    /// Classify an elapsed time against the phase boundaries
    pub(crate) fn classify(config: &SignalConfig, elapsed: Duration) -> Self {
        let ramp = config.ramp_duration.as_secs_f64();
        let peak = config.peak_duration.as_secs_f64();
        let cycle = config.cycle_length().as_secs_f64();

        let position_secs = elapsed.as_secs_f64().rem_euclid(cycle);

        let peak_start = ramp;
        let ramp_down_start = ramp + peak;
        let off_start = ramp_down_start + ramp;

        let (phase, progress) = if position_secs < peak_start {
            (CyclePhase::RampUp, position_secs / ramp)
        } else if position_secs < ramp_down_start {
            (CyclePhase::PeakPlateau, 0.0)
        } else if position_secs < off_start {
            (CyclePhase::RampDown, (position_secs - ramp_down_start) / ramp)
        } else {
            (CyclePhase::OffPlateau, 0.0)
        };

        Self {
            phase,
            position_secs,
            progress: progress.clamp(0.0, 1.0),
        }
    }
}
