//! HTTP client with failover across a list of addresses
//!
//! Clients and servers use it to reach whichever router is alive.

use std::{sync::RwLock, time::Duration};

use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use shopring_common::ShopringError;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Base URLs tried in order
    pub server_addrs: Vec<String>,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Prefix added to every path (e.g. "/shopring/v1")
    pub context_path: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            server_addrs: vec!["http://127.0.0.1:6001".to_string()],
            connect_timeout_ms: 1000,
            read_timeout_ms: 3000,
            context_path: shopring_common::API_PREFIX.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn with_servers(server_addrs: Vec<String>) -> Self {
        Self {
            server_addrs,
            ..Default::default()
        }
    }

    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    pub fn with_context_path(mut self, path: &str) -> Self {
        self.context_path = path.to_string();
        self
    }
}

pub struct FailoverHttpClient {
    client: Client,
    config: HttpClientConfig,
    current_server_index: RwLock<usize>,
}

impl FailoverHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ShopringError> {
        if config.server_addrs.is_empty() {
            return Err(ShopringError::ConfigError(
                "at least one address is required".to_string(),
            ));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .no_proxy()
            .build()
            .map_err(|e| ShopringError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            current_server_index: RwLock::new(0),
        })
    }

    pub fn current_server(&self) -> String {
        let index = *self
            .current_server_index
            .read()
            .unwrap_or_else(|e| e.into_inner());
        self.config.server_addrs[index].clone()
    }

    fn switch_to_next_server(&self) {
        let mut index = self
            .current_server_index
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *index = (*index + 1) % self.config.server_addrs.len();
        debug!("Switched to server index: {}", *index);
    }

    fn build_url(&self, path: &str) -> String {
        let base_url = self.current_server();
        let context_path = &self.config.context_path;

        if context_path.is_empty() {
            format!("{}{}", base_url.trim_end_matches('/'), path)
        } else {
            format!(
                "{}/{}{}",
                base_url.trim_end_matches('/'),
                context_path.trim_matches('/'),
                path
            )
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ShopringError> {
        self.request_with_retry(|client, url| async move { client.get(&url).send().await }, path)
            .await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShopringError> {
        self.request_with_retry(
            |client, url| async move { client.post(&url).json(body).send().await },
            path,
        )
        .await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShopringError> {
        self.request_with_retry(
            |client, url| async move { client.put(&url).json(body).send().await },
            path,
        )
        .await
    }

    /// Tries each address once, starting at the current one
    async fn request_with_retry<T, F, Fut>(&self, request_fn: F, path: &str) -> Result<T, ShopringError>
    where
        T: DeserializeOwned,
        F: Fn(Client, String) -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let max_retries = self.config.server_addrs.len();
        let mut last_error = None;

        for _ in 0..max_retries {
            let url = self.build_url(path);

            match request_fn(self.client.clone(), url).await {
                Ok(response) => return decode_envelope(response).await,
                Err(e) => {
                    warn!("Request failed: {}, switching to next server", e);
                    self.switch_to_next_server();
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(ShopringError::NodeUnavailable(
            self.config.server_addrs.join(","),
            last_error.unwrap_or_else(|| "All servers failed".to_string()),
        ))
    }
}

/// Decode a `{code, message, data}` envelope into its payload
pub async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ShopringError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ShopringError::NetworkError(e.to_string()))?;

    let envelope: shopring_api::Result<serde_json::Value> =
        serde_json::from_str(&body).map_err(|e| {
            ShopringError::NetworkError(format!(
                "unexpected response with status {}: {} ({})",
                status, body, e
            ))
        })?;

    let data = envelope.into_data()?;
    serde_json::from_value(data).map_err(|e| ShopringError::NetworkError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpClientConfig::default();
        assert_eq!(config.server_addrs.len(), 1);
        assert_eq!(config.context_path, "/shopring/v1");
    }

    #[test]
    fn test_empty_addresses_rejected() {
        let config = HttpClientConfig::with_servers(Vec::new());
        assert!(matches!(
            FailoverHttpClient::new(config),
            Err(ShopringError::ConfigError(_))
        ));
    }

    #[test]
    fn test_build_url() {
        let config = HttpClientConfig::with_servers(vec!["http://localhost:6001/".to_string()]);
        let client = FailoverHttpClient::new(config).unwrap();
        assert_eq!(
            client.build_url("/health"),
            "http://localhost:6001/shopring/v1/health"
        );

        let config = HttpClientConfig::with_servers(vec!["http://localhost:6001".to_string()])
            .with_context_path("");
        let client = FailoverHttpClient::new(config).unwrap();
        assert_eq!(client.build_url("/health"), "http://localhost:6001/health");
    }

    #[test]
    fn test_switch_to_next_server_wraps() {
        let config = HttpClientConfig::with_servers(vec![
            "http://a:1".to_string(),
            "http://b:2".to_string(),
        ]);
        let client = FailoverHttpClient::new(config).unwrap();
        assert_eq!(client.current_server(), "http://a:1");
        client.switch_to_next_server();
        assert_eq!(client.current_server(), "http://b:2");
        client.switch_to_next_server();
        assert_eq!(client.current_server(), "http://a:1");
    }

    #[tokio::test]
    async fn test_all_servers_down() {
        // Port 1 is reserved and refuses connections
        let config = HttpClientConfig::with_servers(vec![
            "http://127.0.0.1:1".to_string(),
            "http://127.0.0.1:1".to_string(),
        ])
        .with_timeouts(200, 200);
        let client = FailoverHttpClient::new(config).unwrap();
        let result: Result<serde_json::Value, _> = client.get("/health").await;
        assert!(matches!(result, Err(ShopringError::NodeUnavailable(..))));
    }
}
