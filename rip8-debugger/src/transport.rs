use std::{future::Future, sync::Arc, time::Duration};

use tracing::debug;
use url::Url;

use crate::logging::{method_label, status_label};

/// Single request, single response. Implementations never retry.
pub trait Transport: Clone + Send + Sync + 'static {
    fn get(&self, path: &str) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn post(&self, path: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[derive(Debug)]
pub enum TransportError {
    InvalidBaseUrl(String),
    Unreachable(String),
    Request(reqwest::Error),
    Status(u16),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidBaseUrl(url) => write!(f, "invalid debug server url: {url}"),
            TransportError::Unreachable(message) => {
                write!(f, "debug server unreachable: {message}")
            }
            TransportError::Request(err) => write!(f, "request failed: {err}"),
            TransportError::Status(status) => write!(f, "debug server answered status {status}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Unreachable(err.to_string())
        } else {
            TransportError::Request(err)
        }
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Arc<str>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<String, TransportError> {
        let response = self.prepare(self.client.get(self.url(path))).send().await?;
        let status = response.status();
        debug!("{} {path} -> {}", method_label("GET"), status_label(status.as_u16()));
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn post(&self, path: &str) -> Result<(), TransportError> {
        let response = self.prepare(self.client.post(self.url(path))).send().await?;
        let status = response.status();
        debug!("{} {path} -> {}", method_label("POST"), status_label(status.as_u16()));
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Accepts `http`/`https` origins and strips trailing slashes so paths can be
/// appended verbatim.
pub fn normalize_base_url(url: &str) -> Result<String, TransportError> {
    let trimmed = url.trim();
    let parsed =
        Url::parse(trimmed).map_err(|_| TransportError::InvalidBaseUrl(trimmed.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(TransportError::InvalidBaseUrl(trimmed.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
