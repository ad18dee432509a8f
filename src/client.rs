//! The LogDNA configuration API boundary.
//!
//! [`ConfigApi`] is the seam between the provider and the network. The
//! production implementation is [`HttpClient`]; tests use
//! [`crate::testing::RecordingApi`].

use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ApiError, ProviderError};

/// One call against the configuration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API host, e.g. `v1/config/view/abc`.
    pub path: String,
    /// Already serialized JSON body, sent byte for byte.
    pub body: Option<String>,
}

impl ApiRequest {
    /// A GET of `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    /// A DELETE of `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: None,
        }
    }

    /// A POST of `body` to `path`.
    pub fn post(path: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    /// A PUT of `body` to `path`.
    pub fn put(path: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Sends requests to the configuration API.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Send `request` and return the decoded JSON response body.
    ///
    /// An empty body decodes to `Value::Null`. A non-2xx status is an
    /// [`ApiError::Rejected`] carrying the body verbatim.
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

/// [`ConfigApi`] over HTTPS.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    servicekey: String,
    http_client: reqwest::Client,
}

impl HttpClient {
    /// Build a client for the configured host and service key.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::ClientBuilder::new()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            base_url: config.base_url()?,
            servicekey: config.servicekey.clone(),
            http_client,
        })
    }

    /// The host requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConfigApi for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.base_url.join(&request.path)?;
        debug!(method = %request.method, url = %url, "sending API request");

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header("servicekey", &self.servicekey)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), "received API response");

        if !status.is_success() {
            return Err(ApiError::Rejected {
                method: request.method.to_string(),
                path: request.path,
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
