//! HTTP client with basic authentication and server failover
//!
//! Every request carries the configured credentials. Connection failures move
//! on to the next configured server; HTTP error statuses do not.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Default data store namespace holding configurations, settings and monitoring
pub const DEFAULT_DATA_STORE_NAMESPACE: &str = "d2-reports";

/// Configuration for the HTTP client
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Platform base URLs, tried in order
    pub server_addrs: Vec<String>,
    pub username: String,
    pub password: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Prefix inserted between the base URL and every API path
    pub context_path: String,
    pub data_store_namespace: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            server_addrs: vec!["http://127.0.0.1:8080".to_string()],
            username: "admin".to_string(),
            password: "district".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 60000,
            context_path: String::new(),
            data_store_namespace: DEFAULT_DATA_STORE_NAMESPACE.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new(server_addr: &str) -> Self {
        Self {
            server_addrs: vec![server_addr.trim_end_matches('/').to_string()],
            ..Default::default()
        }
    }

    pub fn with_servers(server_addrs: Vec<String>) -> Self {
        Self {
            server_addrs,
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
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

    pub fn with_data_store_namespace(mut self, namespace: &str) -> Self {
        self.data_store_namespace = namespace.to_string();
        self
    }
}

/// Status and body of a response, whatever the status
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_error(self) -> ClientError {
        ClientError::ServerError {
            status: self.status,
            message: self.body,
        }
    }
}

pub struct ApvdHttpClient {
    client: Client,
    config: HttpClientConfig,
    current_server_index: RwLock<usize>,
}

impl ApvdHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        if config.server_addrs.is_empty() {
            return Err(ClientError::InvalidConfig(
                "at least one server address is required".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            current_server_index: RwLock::new(0),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn current_server(&self) -> String {
        let index = *self.current_server_index.read();
        self.config.server_addrs[index].clone()
    }

    fn switch_to_next_server(&self) {
        let mut index = self.current_server_index.write();
        *index = (*index + 1) % self.config.server_addrs.len();
        debug!("Switched to server index: {}", *index);
    }

    pub(crate) fn build_url(&self, path: &str) -> String {
        let base_url = self.current_server();
        let context_path = self.config.context_path.trim_matches('/');

        if context_path.is_empty() {
            format!("{}{}", base_url, path)
        } else {
            format!("{}/{}{}", base_url, context_path, path)
        }
    }

    pub async fn get_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let response = self
            .send_with_retry(path, |client, url| client.get(url).query(query))
            .await?;
        handle_response(response).await
    }

    /// `None` when the resource does not exist
    pub async fn get_json_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self
            .send_with_retry(path, |client, url| client.get(url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    pub async fn post_json<B: Serialize + ?Sized, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        body: &B,
    ) -> Result<RawResponse> {
        let response = self
            .send_with_retry(path, |client, url| client.post(url).query(query).json(body))
            .await?;
        into_raw(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<RawResponse> {
        let response = self
            .send_with_retry(path, |client, url| client.put(url).json(body))
            .await?;
        into_raw(response).await
    }

    async fn send_with_retry<F>(&self, path: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let max_retries = self.config.server_addrs.len();
        let mut last_error = None;

        for _ in 0..max_retries {
            let url = self.build_url(path);
            let request = build(&self.client, &url)
                .basic_auth(&self.config.username, Some(&self.config.password));

            match request.send().await {
                Ok(response) if response.status() == StatusCode::UNAUTHORIZED => {
                    return Err(ClientError::Unauthorized(format!(
                        "credentials rejected for user {}",
                        self.config.username
                    )));
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Request to {} failed: {}, switching to next server", url, e);
                    self.switch_to_next_server();
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(ClientError::Http)
            .unwrap_or(ClientError::AllServersFailed))
    }
}

async fn into_raw(response: Response) -> Result<RawResponse> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RawResponse { status, body })
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let raw = into_raw(response).await?;
    if !raw.is_success() {
        tracing::error!("Request failed with status {}: {}", raw.status, raw.body);
        return Err(raw.into_error());
    }
    Ok(serde_json::from_str(&raw.body)?)
}
