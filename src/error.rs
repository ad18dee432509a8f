//! Error types for the LogDNA provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found on the remote side.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider was asked to operate before `configure` ran.
    #[error("Provider is not configured")]
    NotConfigured,

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The resource configuration produced error diagnostics, so no request
    /// was sent.
    #[error("Invalid resource configuration: {}", summarize(.0))]
    InvalidConfig(Vec<Diagnostic>),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The LogDNA API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg) => msg.clone(),
            Self::NotConfigured => "provider is not configured".to_string(),
            Self::InvalidConfig(diagnostics) => summarize(diagnostics),
            Self::Serialization(err) => err.to_string(),
            Self::Api(err) => err.to_string(),
        }
    }

    /// Diagnostics carried by this error, or a single error diagnostic
    /// describing it.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::InvalidConfig(diagnostics) => diagnostics,
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

/// Errors at the LogDNA API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("error during HTTP request: {0}")]
    Transport(String),

    /// The API answered with a non-success status. The body is kept verbatim.
    #[error("API rejected {method} {path} with status {status}: {body}")]
    Rejected {
        /// HTTP method of the rejected request.
        method: String,
        /// Path of the rejected request.
        path: String,
        /// Status code returned.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("failed to decode API response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the API reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.detail {
            Some(detail) => format!("{}: {}", d.summary, detail),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
