//! Workload Simulator CLI
//!
//! Inspects a running workload simulator over its HTTP API and previews
//! the deterministic load curve for a set of cycle parameters.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{curve, health, status};

/// Workload Simulator CLI
#[derive(Parser)]
#[command(name = "wsim")]
#[command(author, version, about = "CLI for the workload simulator", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via WSIM_API_URL env var)
    #[arg(long, env = "WSIM_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current load, shadow pool, and running statistics
    Status,

    /// Show component health
    Health,

    /// Print the deterministic base curve (no server needed)
    Curve(curve::CurveArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let client = client::ApiClient::new(&cli.api_url)?;
            status::show_status(&client, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            health::show_health(&client, cli.format).await?;
        }
        Commands::Curve(args) => {
            curve::show_curve(&args, cli.format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_with_defaults() {
        let cli = Cli::try_parse_from(["wsim", "status"]).unwrap();
        assert_eq!(cli.api_url, "http://localhost:8080");
        assert!(matches!(cli.format, output::OutputFormat::Table));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "wsim",
            "--api-url",
            "http://sim:9090",
            "--format",
            "json",
            "health",
        ])
        .unwrap();
        assert_eq!(cli.api_url, "http://sim:9090");
        assert!(matches!(cli.format, output::OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Health));
    }

    #[test]
    fn test_parse_curve_flags() {
        let cli = Cli::try_parse_from([
            "wsim",
            "curve",
            "--from",
            "100",
            "--to",
            "900",
            "--step",
            "50",
            "--ramp-duration",
            "120",
            "--peak-level",
            "40",
        ])
        .unwrap();

        let Commands::Curve(args) = cli.command else {
            panic!("expected curve command");
        };
        assert_eq!(args.from, 100.0);
        assert_eq!(args.to, Some(900.0));
        assert_eq!(args.step, 50.0);
        assert_eq!(args.ramp_duration, Some(120.0));
        assert_eq!(args.peak_level, Some(40.0));
        assert_eq!(args.off_level, None);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["wsim", "--format", "yaml", "status"]).is_err());
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["wsim"]).is_err());
    }
}
