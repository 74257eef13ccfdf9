//! Curve command
//!
//! Evaluates the noise-free base curve locally, so cycle parameters can be
//! tried out before they are deployed.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use simulator_lib::{SignalConfig, SignalGenerator};
use std::time::Duration;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};

/// Upper bound on the number of printed points
const MAX_POINTS: usize = 10_000;

/// Range and cycle parameters for the curve
#[derive(Args, Debug, Clone)]
pub struct CurveArgs {
    /// Start of the range, in seconds of elapsed time
    #[arg(long, default_value_t = 0.0)]
    pub from: f64,

    /// End of the range in seconds (defaults to one full cycle)
    #[arg(long)]
    pub to: Option<f64>,

    /// Distance between points, in seconds
    #[arg(long, default_value_t = 300.0)]
    pub step: f64,

    /// Peak plateau length in seconds
    #[arg(long)]
    pub peak_duration: Option<f64>,

    /// Off-peak plateau length in seconds
    #[arg(long)]
    pub off_duration: Option<f64>,

    /// Length of each ramp in seconds
    #[arg(long)]
    pub ramp_duration: Option<f64>,

    /// Base level during the peak plateau
    #[arg(long)]
    pub peak_level: Option<f64>,

    /// Base level during the off-peak plateau
    #[arg(long)]
    pub off_level: Option<f64>,

    /// Lower clamp for the emitted value
    #[arg(long)]
    pub min_users: Option<u32>,

    /// Upper bound before the burst multiplier is applied
    #[arg(long)]
    pub max_users: Option<u32>,
}

impl CurveArgs {
    /// Cycle parameters with the overrides applied to the defaults
    fn signal_config(&self) -> Result<SignalConfig> {
        let defaults = SignalConfig::default();
        Ok(SignalConfig {
            peak_duration: seconds(self.peak_duration, defaults.peak_duration, "peak-duration")?,
            off_duration: seconds(self.off_duration, defaults.off_duration, "off-duration")?,
            ramp_duration: seconds(self.ramp_duration, defaults.ramp_duration, "ramp-duration")?,
            peak_base_level: self.peak_level.unwrap_or(defaults.peak_base_level),
            off_base_level: self.off_level.unwrap_or(defaults.off_base_level),
            min_users: self.min_users.unwrap_or(defaults.min_users),
            max_users: self.max_users.unwrap_or(defaults.max_users),
            ..defaults
        })
    }
}

fn seconds(value: Option<f64>, default: Duration, flag: &str) -> Result<Duration> {
    match value {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("--{} must be a non-negative number of seconds", flag)),
        None => Ok(default),
    }
}

/// One point of the base curve
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CurvePoint {
    #[tabled(rename = "Elapsed (s)")]
    pub elapsed_secs: f64,
    #[tabled(rename = "Phase", display_with = "display_phase")]
    pub phase: simulator_lib::CyclePhase,
    #[tabled(rename = "Base Level", display_with = "display_level")]
    pub base_level: f64,
    /// Base level rounded and clamped, i.e. the load with unit noise and no burst
    #[tabled(rename = "Users")]
    pub users: u32,
}

fn display_phase(phase: &simulator_lib::CyclePhase) -> String {
    phase.to_string()
}

fn display_level(level: &f64) -> String {
    format!("{:.1}", level)
}

/// Evaluate the base curve over `[from, to]` in `step` increments
pub fn curve_points(config: SignalConfig, from: f64, to: f64, step: f64) -> Result<Vec<CurvePoint>> {
    if step.is_nan() || step <= 0.0 {
        anyhow::bail!("--step must be greater than zero");
    }
    if from.is_nan() || from < 0.0 {
        anyhow::bail!("--from must not be negative");
    }
    if to < from {
        anyhow::bail!("--to ({}) must not be before --from ({})", to, from);
    }
    let count = ((to - from) / step).floor() as usize + 1;
    if count > MAX_POINTS {
        anyhow::bail!(
            "Range would print {} points (max {}); increase --step",
            count,
            MAX_POINTS
        );
    }

    let min_users = config.min_users;
    let generator = SignalGenerator::new(config).context("Invalid cycle parameters")?;
    let ceiling = generator.ceiling();

    Ok((0..count)
        .map(|i| {
            let elapsed_secs = from + step * i as f64;
            let elapsed = Duration::from_secs_f64(elapsed_secs);
            let base_level = generator.base_level(elapsed);
            CurvePoint {
                elapsed_secs,
                phase: generator.phase_at(elapsed).phase,
                base_level,
                users: (base_level.round() as u32).clamp(min_users, ceiling),
            }
        })
        .collect())
}

/// Print the base curve
pub fn show_curve(args: &CurveArgs, format: OutputFormat) -> Result<()> {
    let config = args.signal_config()?;
    let to = args
        .to
        .unwrap_or_else(|| config.cycle_length().as_secs_f64());

    let points = curve_points(config, args.from, to, args.step)?;
    print_table(&points, format);

    Ok(())
}
