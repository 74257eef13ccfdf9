//! Workload simulator library
//!
//! This crate provides the core of the workload simulator:
//! - A four-phase synthetic "concurrent users" signal with noise and bursts
//! - Resource shadowing (CPU burn and held memory) that tracks the signal
//! - A fixed-interval tick loop publishing read-only status snapshots
//! - Health checks and observability

pub mod config;
pub mod health;
pub mod models;
pub mod observability;
pub mod shadow;
pub mod signal;
pub mod simulator;

pub use config::{ConfigError, ShadowConfig, SignalConfig};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::StatusSnapshot;
pub use observability::{SimulatorMetrics, StructuredLogger};
pub use signal::{BurstEvent, CyclePhase, SignalGenerator, SignalSample};
pub use simulator::{
    SimulationLoop, SimulationLoopBuilder, Simulator, StatusReceiver, TickObservation,
};
