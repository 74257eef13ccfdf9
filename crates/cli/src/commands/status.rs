//! Status command

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{
    color_phase, format_elapsed, format_millis, format_timestamp, print_json, print_warning,
    OutputFormat,
};

/// Show the simulator's latest snapshot
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot = client.status().await?;

    if let OutputFormat::Json = format {
        return print_json(&snapshot);
    }

    println!("{}", "Workload Simulator".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Started:                {}",
        format_timestamp(snapshot.started_at).dimmed()
    );
    println!(
        "Elapsed:                {}",
        format_elapsed(snapshot.elapsed_secs)
    );
    println!("Phase:                  {}", color_phase(snapshot.phase));
    println!("Base level:             {:.1}", snapshot.base_level);
    match snapshot.current_users {
        Some(users) => println!(
            "Users:                  {} (ceiling {})",
            users.to_string().cyan().bold(),
            snapshot.ceiling_users
        ),
        None => print_warning("No tick has completed yet"),
    }
    println!();

    println!("{}", "Memory Shadow".bold());
    println!("{}", "-".repeat(50));
    println!("Pool:                   {} MB", snapshot.memory_pool_mb);
    println!("Target:                 {} MB", snapshot.memory_target_mb);
    if snapshot.memory_pool_mb < snapshot.memory_target_mb {
        print_warning("Pool is below target (allocation pressure)");
    }
    println!();

    let stats = &snapshot.statistics;
    println!("{}", "Statistics".bold());
    println!("{}", "-".repeat(50));
    println!("Ticks:                  {}", stats.ticks);
    println!("Cumulative requests:    {}", stats.cumulative_requests);
    println!("Mean load:              {:.1}", stats.mean_load());
    println!("Peak load:              {}", stats.peak_load);
    println!(
        "Peak CPU burn:          {}",
        format_millis(stats.peak_cpu_burn.as_secs_f64() * 1000.0)
    );
    println!("Peak pool:              {} MB", stats.peak_pool_mb);
    println!("Bursts:                 {}", stats.bursts);
    println!("Pressure events:        {}", stats.pressure_events);

    if let Some(burst) = snapshot.last_burst {
        println!();
        let at = snapshot
            .last_burst_at
            .map(format_timestamp)
            .unwrap_or_default();
        println!(
            "Last burst: {} users at {} {}",
            burst.users.to_string().red().bold(),
            format_elapsed(burst.elapsed_secs),
            at.dimmed()
        );
    }

    println!();
    println!(
        "Last updated: {}",
        format_timestamp(snapshot.updated_at).dimmed()
    );

    Ok(())
}
