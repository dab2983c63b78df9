//! Overpass API client
//!
//! Sends a single GET per search to the interpreter endpoint with the
//! Overpass QL text in the `data` parameter. There is no retry: transport
//! failures and non-success statuses both surface as
//! [`NearbyError::Network`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::OverpassConfig;
use crate::{NearbyError, Result};

/// Longest slice of an error response body kept in the error message
const ERROR_BODY_PREVIEW: usize = 200;

/// Anything that can answer an Overpass QL query with a raw response body
#[async_trait]
pub trait PlaceSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String>;
}

/// HTTP client for an Overpass interpreter endpoint
pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

impl OverpassClient {
    /// Create a new client
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout.into()));
        }

        let client = builder
            .build()
            .map_err(|e| NearbyError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PlaceSource for OverpassClient {
    #[instrument(skip(self, query), fields(endpoint = %self.endpoint))]
    async fn fetch(&self, query: &str) -> Result<String> {
        debug!("Overpass query:\n{}", query);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query)])
            .send()
            .await
            .map_err(|e| NearbyError::network(format!("Overpass request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let preview: String = error_text.trim().chars().take(ERROR_BODY_PREVIEW).collect();
            warn!("Overpass API responded with {}", status);
            return Err(NearbyError::network(format!(
                "Overpass API error {status}: {preview}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NearbyError::network(format!("Failed to read Overpass response: {e}")))?;

        info!(
            "Received {} bytes from Overpass in {:.3}s",
            body.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(endpoint: String) -> OverpassConfig {
        OverpassConfig {
            endpoint,
            ..OverpassConfig::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OverpassClient::new(&OverpassConfig::default()).unwrap();
        assert_eq!(client.endpoint(), "https://overpass-api.de/api/interpreter");
    }

    #[tokio::test]
    async fn test_fetch_sends_query_as_data_parameter() {
        let server = MockServer::start().await;
        let query = "[out:json];\nnode[tourism=hotel](around:1000,7.9,-72.5);\nout body;";

        Mock::given(method("GET"))
            .and(path("/api/interpreter"))
            .and(query_param("data", query))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"elements":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OverpassClient::new(&config_for(format!("{}/api/interpreter", server.uri()))).unwrap();
        let body = client.fetch(query).await.unwrap();
        assert_eq!(body, r#"{"elements":[]}"#);
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client =
            OverpassClient::new(&config_for(format!("{}/api/interpreter", server.uri()))).unwrap();
        let err = client.fetch("[out:json];").await.unwrap_err();
        match err {
            NearbyError::Network { message } => {
                assert!(message.contains("429"), "{message}");
                assert!(message.contains("rate limited"), "{message}");
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        // Nothing listens on the discard port locally
        let client =
            OverpassClient::new(&config_for("http://127.0.0.1:9/api/interpreter".into())).unwrap();
        let err = client.fetch("[out:json];").await.unwrap_err();
        assert!(matches!(err, NearbyError::Network { .. }));
    }
}
