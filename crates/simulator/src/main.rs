//! Workload Simulator - synthetic load signal with resource shadowing
//!
//! Runs the tick loop that turns a four-phase "concurrent users" signal
//! into CPU burn and held memory, and serves health, metrics, and status.

use anyhow::{Context, Result};
use simulator_lib::{
    health::HealthRegistry,
    observability::{SimulatorMetrics, StructuredLogger},
    SimulationLoopBuilder, Simulator,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use workload_simulator::{api, config};

const SIMULATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting workload-simulator");

    // Invalid configuration is fatal
    let config = config::SimulatorConfig::load()?;
    let simulator = Simulator::new(config.signal_config(), config.shadow_config())?;
    info!(
        instance = %config.instance_name,
        cycle_length_secs = simulator.generator().cycle_length().as_secs_f64(),
        seeded = config.rng_seed.is_some(),
        "Simulator configured"
    );

    let health_registry = HealthRegistry::with_simulator_components().await;
    let metrics = SimulatorMetrics::new();

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        SIMULATOR_VERSION,
        simulator.generator().cycle_length().as_secs_f64(),
        config.tick_interval(),
    );

    let (sim_loop, status) = SimulationLoopBuilder::new()
        .simulator(simulator)
        .seed(config.rng_seed)
        .interval(config.tick_interval())
        .metrics(metrics.clone())
        .health(health_registry.clone())
        .logger(logger.clone())
        .build()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let loop_handle = tokio::spawn(sim_loop.run(shutdown_rx));

    let app_state = Arc::new(api::AppState::new(health_registry, metrics, status));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let mut api_error = None;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match api_outcome(result) {
                Ok(()) => logger.log_shutdown("API server stopped"),
                Err(e) => {
                    error!(error = %e, "API server failed");
                    api_error = Some(e);
                }
            }
        }
    }

    // No tick spans the shutdown; stopping the timer is enough
    let _ = shutdown_tx.send(());
    if let Err(e) = loop_handle.await {
        error!(error = %e, "Simulation loop task failed");
    }
    info!("Shutting down");

    match api_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Flatten the API task result into the server's own error
fn api_outcome(result: Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(served) => served.context("API server failed"),
        Err(e) => Err(anyhow::Error::new(e).context("API server task panicked")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_outcome_clean_stop() {
        assert!(api_outcome(Ok(Ok(()))).is_ok());
    }

    #[test]
    fn test_api_outcome_propagates_server_error() {
        let err = api_outcome(Ok(Err(anyhow::anyhow!("address in use")))).unwrap_err();
        assert!(format!("{:#}", err).contains("address in use"));
    }

    #[tokio::test]
    async fn test_api_outcome_propagates_panic() {
        let result = tokio::spawn(async {
            if true {
                panic!("server crashed");
            }
            Ok::<(), anyhow::Error>(())
        })
        .await;

        let err = api_outcome(result).unwrap_err();
        assert!(err.to_string().contains("panicked"));
    }
}
