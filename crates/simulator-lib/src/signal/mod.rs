//! Synthetic "concurrent users" signal
//!
//! A repeating four-phase waveform (ramp-up, peak plateau, ramp-down,
//! off-peak plateau) with multiplicative noise and random bursts layered
//! on top of the deterministic base level.

mod generator;
mod phase;

pub use generator::{BurstEvent, SignalGenerator, SignalSample, NOISE_MAX, NOISE_MIN};
pub use phase::{CyclePhase, PhasePosition};
