//! HTTP client for a running efficiency server

use anyhow::{Context, Result};
use efficiency_lib::predictor::HealthStatus;
use reqwest::{Client, StatusCode};
use url::Url;

/// Client for the server's health endpoint
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid server URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch `/health`.
    ///
    /// A 503 still carries the health body, so both 200 and 503 are parsed;
    /// any other status is an error.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.base_url.join("health").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Server error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse health response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efficiency_lib::predictor::ServiceStatus;

    #[tokio::test]
    async fn test_health_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model_loaded":true,"scaler_loaded":true,"status":"healthy"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert!(health.model_loaded);
        assert_eq!(health.status, ServiceStatus::Healthy);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_unavailable_still_parsed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model_loaded":false,"scaler_loaded":true,"status":"unhealthy"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert!(!health.model_loaded);
        assert_eq!(health.status, ServiceStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_health_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
