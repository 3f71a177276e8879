//! HTTP implementation of the transport seam.
//!
//! Talks to the dashboard API with reqwest. The session credential is an HTTP
//! cookie kept in the client's cookie store, so every request made through one
//! `HttpTransport` shares the login established by the first.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use vibe_core::config::ClientConfig;
use vibe_core::transport::{ApiRequest, Method, Transport};
use vibe_core::{Result, SyncError};

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the configured base URL and request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()
            .map_err(transport_error)?;

        tracing::debug!(
            "[HttpTransport] Initialized with base URL: {}",
            config.api_base_url
        );

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build(&self, request: &ApiRequest) -> RequestBuilder {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<serde_json::Value>> {
        tracing::debug!("[HttpTransport] {}", request);

        let response = self
            .build(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::debug!("[HttpTransport] {} failed with {}", request, status);
            return Err(SyncError::from_response(status.as_u16(), &text));
        }

        if !is_json || text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| {
            SyncError::transport(format!("Undecodable response body from {}: {}", request, e))
        })
    }
}

/// Maps a reqwest failure (connect, timeout, body read) to a transport error.
pub fn transport_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        SyncError::transport(format!("Request timed out: {}", err))
    } else {
        SyncError::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            ..ClientConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_url_join() {
        let t = transport("http://127.0.0.1:8000/");
        assert_eq!(t.base_url(), "http://127.0.0.1:8000");
        assert_eq!(
            t.url("/api/v1/jobs/list"),
            "http://127.0.0.1:8000/api/v1/jobs/list"
        );
        assert_eq!(
            t.url("api/v1/jobs/list"),
            "http://127.0.0.1:8000/api/v1/jobs/list"
        );
    }
}
