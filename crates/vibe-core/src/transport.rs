//! Transport seam.
//!
//! Defines the request primitive every remote call goes through. The
//! synchronization layer never talks HTTP directly; it is handed an
//! `Arc<dyn Transport>` and builds `ApiRequest`s.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A transport-agnostic request against the remote API.
///
/// `path` is relative to the configured base URL (e.g. `/api/v1/jobs/list`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets a JSON body.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// The request primitive consumed by the synchronization layer.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Attach the session credential (cookie) automatically
/// - Map non-2xx responses through [`SyncError::from_response`] so that 401
///   becomes [`SyncError::Unauthorized`]
/// - Map network failures to [`SyncError::Transport`]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: 2xx with a JSON body
    /// - `Ok(None)`: 2xx with an empty or non-JSON body
    /// - `Err(_)`: transport failure or non-2xx status
    async fn send(&self, request: ApiRequest) -> Result<Option<serde_json::Value>>;
}

/// Typed helpers on top of [`Transport::send`].
#[async_trait]
pub trait TransportExt: Transport {
    /// Sends a request and decodes the JSON body into `T`.
    ///
    /// An empty body is a transport error here: the caller asked for data.
    async fn send_json<T: DeserializeOwned + Send>(&self, request: ApiRequest) -> Result<T> {
        let description = request.to_string();
        match self.send(request).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(SyncError::transport(format!(
                "{} returned an empty body",
                description
            ))),
        }
    }

    /// Sends a request and discards any body.
    async fn send_unit(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct Fixed(Option<serde_json::Value>);

    #[async_trait]
    impl Transport for Fixed {
        async fn send(&self, _request: ApiRequest) -> Result<Option<serde_json::Value>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Status {
        authenticated: bool,
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/api/v1/albums/list")
            .with_query("query", "midnight")
            .with_query("usable", true);
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.query,
            vec![
                ("query".to_string(), "midnight".to_string()),
                ("usable".to_string(), "true".to_string())
            ]
        );
        assert_eq!(request.to_string(), "GET /api/v1/albums/list");
    }

    #[test]
    fn test_with_json_body() {
        let request = ApiRequest::post("/api/v1/jobs/update")
            .with_json(&serde_json::json!({"job_name": "sampler", "run_now": true}))
            .unwrap();
        assert_eq!(request.body.unwrap()["job_name"], "sampler");
    }

    #[tokio::test]
    async fn test_send_json_decodes_body() {
        let transport = Fixed(Some(serde_json::json!({"authenticated": true})));
        let status: Status = transport
            .send_json(ApiRequest::get("/status"))
            .await
            .unwrap();
        assert_eq!(status, Status { authenticated: true });
    }

    #[tokio::test]
    async fn test_send_json_rejects_empty_body() {
        let transport = Fixed(None);
        let err = transport
            .send_json::<Status>(ApiRequest::get("/status"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
