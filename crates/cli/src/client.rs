//! API client for communicating with the simulator HTTP API

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use simulator_lib::{HealthResponse, StatusSnapshot};
use url::Url;

/// API client for the simulator
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_accepting(path, &[]).await
    }

    /// Make a GET request that also parses the listed non-success statuses
    async fn get_accepting<T: DeserializeOwned>(
        &self,
        path: &str,
        accepted: &[StatusCode],
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() && !accepted.contains(&status) {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch the latest status snapshot
    pub async fn status(&self) -> Result<StatusSnapshot> {
        self.get("api/status").await
    }

    /// Fetch component health
    ///
    /// An unhealthy simulator answers 503 with the same body, which is
    /// still worth showing.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_accepting("healthz", &[StatusCode::SERVICE_UNAVAILABLE])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulator_lib::{ComponentStatus, CyclePhase};

    const STATUS_BODY: &str = r#"{
        "started_at": 1700000000,
        "updated_at": 1700000120,
        "elapsed_secs": 1200.0,
        "phase": "peak-plateau",
        "base_level": 65.0,
        "current_users": 71,
        "ceiling_users": 120,
        "memory_pool_mb": 36,
        "memory_target_mb": 36,
        "last_burst": {"elapsed_secs": 1100.0, "users": 97},
        "last_burst_at": 1700001100,
        "statistics": {
            "ticks": 60,
            "cumulative_requests": 2400,
            "peak_load": 97,
            "peak_cpu_burn_ms": 485.0,
            "peak_pool_mb": 49,
            "bursts": 1,
            "pressure_events": 0
        },
        "signal": {
            "peak_duration": 3600.0,
            "off_duration": 3600.0,
            "ramp_duration": 300.0,
            "peak_base_level": 65.0,
            "off_base_level": 10.0,
            "min_users": 5,
            "max_users": 80,
            "burst_probability": 0.05,
            "burst_multiplier": 1.5
        },
        "shadow": {
            "per_user_mb": 0.5,
            "hysteresis_mb": 2,
            "cpu_cost_per_user": 5.0,
            "max_cpu_burn": 1500.0
        }
    }"#;

    #[tokio::test]
    async fn test_status_parses_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(STATUS_BODY)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let snapshot = client.status().await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.phase, CyclePhase::PeakPlateau);
        assert_eq!(snapshot.current_users, Some(71));
        assert_eq!(snapshot.statistics.peak_load, 97);
        assert_eq!(snapshot.last_burst.unwrap().users, 97);
        assert_eq!(
            snapshot.shadow.cpu_cost_per_user,
            std::time::Duration::from_millis(5)
        );
    }

    #[tokio::test]
    async fn test_health_accepts_unavailable_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"unhealthy","components":{"ticker":{"status":"unhealthy","message":"Tick task failed","last_check_timestamp":1700000000}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();

        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(
            health.components["ticker"].message.as_deref(),
            Some("Tick task failed")
        );
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/status")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.status().await.unwrap_err();

        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
