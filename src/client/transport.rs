use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tracing::debug;

use super::api::{ApiRequest, Method};
use super::error::ApiError;
use crate::{
    app::{build_app, API_PREFIX},
    extractors::OWNER_HEADER,
    state::AppState,
};

/// Carries one JSON request to the backend and returns the decoded body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError>;
}

fn parse_response(status: u16, bytes: &[u8]) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, bytes));
    }
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::Server {
        status,
        message: format!("invalid JSON body: {e}"),
    })
}

/// Serves requests through the application router without a socket.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_app(state),
        }
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let mut builder = Request::builder()
            .method(req.method.as_str())
            .uri(format!("{API_PREFIX}{}", req.path))
            .header(OWNER_HEADER, req.owner.to_string());

        let body = match &req.body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let res = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| match e {})?;

        let status = res.status().as_u16();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!(method = req.method.as_str(), path = %req.path, status, "in-process request");
        parse_response(status, &bytes)
    }
}

/// Talks to a running server over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// * `base_url` - server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let method = match req.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self
            .client
            .request(method, self.url(&req.path))
            .header(OWNER_HEADER, req.owner.to_string());
        if let Some(json) = &req.body {
            request = request.json(json);
        }

        let res = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = res.status().as_u16();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!(method = req.method.as_str(), path = %req.path, status, "http request");
        parse_response(status, &bytes)
    }
}
