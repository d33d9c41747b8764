//! API client for communicating with the ClusterPulse agent

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

/// Thin HTTP client for the agent API
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
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body.
    ///
    /// `timeout` overrides the client default; the task-run endpoint blocks
    /// for up to the script's own timeout, so the request deadline has to
    /// outlive it.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        timeout: std::time::Duration,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

/// Parse a cluster route response into records, surfacing the error
/// sentinel the agent returns when collection failed and fallback is off.
pub fn parse_records<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>> {
    if let Some(first) = value.as_array().and_then(|items| items.first()) {
        if first.get("mock").and_then(|m| m.as_bool()) == Some(true) {
            if let Some(error) = first.get("error").and_then(|e| e.as_str()) {
                anyhow::bail!("agent reported a collection failure: {error}");
            }
        }
    }
    serde_json::from_value(value).context("Failed to parse records")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterpulse_lib::models::NamespaceRecord;

    #[test]
    fn test_parse_records_accepts_record_list() {
        let value = serde_json::json!([
            {"name": "default", "status": "Active"},
            {"name": "production", "status": "Active"},
        ]);
        let records: Vec<NamespaceRecord> = parse_records(value).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_records_rejects_sentinel() {
        let value = serde_json::json!([
            {"error": "cannot connect to control plane", "mock": true},
        ]);
        let err = parse_records::<NamespaceRecord>(value).unwrap_err();
        assert!(err.to_string().contains("collection failure"));
    }

    #[tokio::test]
    async fn test_get_deserializes_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/cluster/namespaces")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name":"default","status":"Active"}]"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let records: Vec<NamespaceRecord> =
            client.get("api/v1/cluster/namespaces").await.unwrap();

        mock.assert_async().await;
        assert_eq!(records[0].name, "default");
    }

    #[tokio::test]
    async fn test_get_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/cluster/nodes")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .get::<Vec<NamespaceRecord>>("api/v1/cluster/nodes")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API error"));
    }
}
