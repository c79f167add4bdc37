//! Shared HTTP transport
//!
//! A single pooled `reqwest::Client` used for every remote call. Performs
//! exactly one attempt per call; retries belong to [`crate::retry`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH};

use crate::error::{Result, ScoutError};

/// Hard ceiling on response bodies (10 MiB)
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Fixed per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("plugscout/", env!("CARGO_PKG_VERSION"));

/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_body: usize,
}

impl HttpClient {
    /// Build a client with the default timeout and body ceiling
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|source| ScoutError::Network {
                url: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            max_body: MAX_RESPONSE_SIZE,
        })
    }

    /// Lower the body ceiling (tests use this to avoid 10 MiB fixtures)
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    pub fn max_body(&self) -> usize {
        self.max_body
    }

    /// GET `url` and return the body bytes
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes_with(url, HeaderMap::new()).await
    }

    /// GET a GitHub-style REST endpoint, optionally authenticated
    pub async fn get_api(&self, url: &str, token: Option<&str>) -> Result<Vec<u8>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        self.get_bytes_with(url, headers).await
    }

    /// Single GET attempt with extra headers.
    ///
    /// Non-2xx responses become [`ScoutError::HttpStatus`]. Bodies larger
    /// than the ceiling become [`ScoutError::ResponseTooLarge`]; a body of
    /// exactly the ceiling is accepted.
    pub async fn get_bytes_with(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>> {
        let network = |source| ScoutError::Network {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok())
        {
            if len > self.max_body {
                tracing::warn!(
                    url,
                    content_length = len,
                    max = self.max_body,
                    "rejected response: Content-Length exceeds limit"
                );
                return Err(self.too_large(url));
            }
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(network)? {
            if chunk.len() > self.max_body - body.len() {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn too_large(&self, url: &str) -> ScoutError {
        ScoutError::ResponseTooLarge {
            url: url.to_string(),
            limit: self.max_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_cap_is_ten_mebibytes() {
        assert_eq!(MAX_RESPONSE_SIZE, 10 * 1024 * 1024);
    }

    #[test]
    fn test_user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("plugscout/"));
    }

    #[test]
    fn test_client_builds_with_custom_limits() {
        let client = HttpClient::with_timeout(Duration::from_secs(5))
            .unwrap()
            .with_max_body(1024);
        assert_eq!(client.max_body(), 1024);
    }
}
