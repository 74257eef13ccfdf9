//! Health command

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use simulator_lib::{ComponentStatus, HealthResponse};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, format_timestamp, print_json, print_table, OutputFormat};

/// Row for the component health table
#[derive(Tabled, Serialize)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

fn status_name(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

fn component_rows(health: &HealthResponse) -> Vec<ComponentRow> {
    let mut names: Vec<&String> = health.components.keys().collect();
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let component = &health.components[name];
            ComponentRow {
                component: name.clone(),
                status: color_status(status_name(component.status)),
                message: component.message.clone().unwrap_or_else(|| "-".to_string()),
                last_check: format_timestamp(component.last_check_timestamp),
            }
        })
        .collect()
}

/// Show overall and per-component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    if let OutputFormat::Json = format {
        return print_json(&health);
    }

    println!(
        "{} {}",
        "Overall:".bold(),
        color_status(status_name(health.status)).bold()
    );
    println!();
    print_table(&component_rows(&health), format);

    Ok(())
}
