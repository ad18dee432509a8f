//! Testing utilities for the provider.
//!
//! [`RecordingApi`] stands in for the LogDNA API: it records every request
//! and answers from a scripted queue. [`ProviderTester`] drives a
//! [`ProviderService`] the way a host would, without a wire protocol.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use terraform_provider_logdna::testing::{ProviderTester, RecordingApi};
//! use terraform_provider_logdna::LogdnaProvider;
//!
//! # tokio_test::block_on(async {
//! let api = Arc::new(RecordingApi::new());
//! api.respond_with(json!({"id": "cat1"}));
//! api.respond_with(json!({"id": "cat1", "name": "ops", "type": "views"}));
//!
//! let tester = ProviderTester::new(LogdnaProvider::with_api(api.clone()));
//! let state = tester
//!     .create("logdna_category", json!({"name": "ops", "type": "views"}))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(state["id"], "cat1");
//! assert_eq!(api.requests()[0].path, "v1/config/category");
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ApiRequest, ConfigApi};
use crate::error::{ApiError, ProviderError};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::ImportedResource;

/// An in-memory [`ConfigApi`] that records requests and replays scripted
/// responses in order.
///
/// Once the script runs out every request is answered with `null`.
#[derive(Debug, Default)]
pub struct RecordingApi {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
}

impl RecordingApi {
    /// An API with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn respond_with(&self, body: Value) {
        self.push(Ok(body));
    }

    /// Queue a rejection with `status` and the raw `body`.
    pub fn reject(&self, status: u16, body: &str) {
        self.push(Err(ApiError::Rejected {
            method: String::new(),
            path: String::new(),
            status,
            body: body.to_string(),
        }));
    }

    /// Queue a transport failure.
    pub fn fail(&self, message: &str) {
        self.push(Err(ApiError::Transport(message.to_string())));
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, response: Result<Value, ApiError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }
}

#[async_trait]
impl ConfigApi for RecordingApi {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let method = request.method.to_string();
        let path = request.path.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        match next {
            Some(Err(ApiError::Rejected { status, body, .. })) => Err(ApiError::Rejected {
                method,
                path,
                status,
                body,
            }),
            Some(response) => response,
            None => Ok(Value::Null),
        }
    }
}

/// A test harness for provider implementations.
///
/// Wraps a `ProviderService` and exposes its operations with diagnostics
/// turned into errors, plus lifecycle helpers.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.resource_types()
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Create a new resource.
    pub async fn create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, config).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior_state, config).await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Create, then read back.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.create(resource_type, config).await?;
        self.read(resource_type, created).await
    }

    /// Update, then read back.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let updated = self.update(resource_type, prior_state, config).await?;
        self.read(resource_type, updated).await
    }

    /// create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    let has_errors = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error));

    assert!(has_errors, "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_recording_api_replays_in_order() {
        let api = RecordingApi::new();
        api.respond_with(json!({"id": "1"}));
        api.reject(404, "missing");
        api.fail("connection reset");

        let first = assert_ok!(api.send(ApiRequest::get("v1/config/view/1")).await);
        assert_eq!(first["id"], "1");

        match api.send(ApiRequest::delete("v1/config/view/2")).await {
            Err(ApiError::Rejected { method, path, status, body }) => {
                assert_eq!(method, "DELETE");
                assert_eq!(path, "v1/config/view/2");
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let err = api.send(ApiRequest::get("v1/config/view/3")).await.unwrap_err();
        assert_eq!(err.to_string(), "error during HTTP request: connection reset");

        // script exhausted
        assert_eq!(api.send(ApiRequest::get("v1/config/view/4")).await.unwrap(), Value::Null);

        let requests = api.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[1].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_tester_resource_types() {
        let tester = ProviderTester::new(crate::LogdnaProvider::new());
        assert_eq!(
            tester.resource_types(),
            vec!["logdna_alert", "logdna_category", "logdna_view"]
        );
        assert_eq!(tester.schema().resources.len(), 3);
    }

    #[tokio::test]
    async fn test_tester_validate_resource_config() {
        let tester = ProviderTester::new(crate::LogdnaProvider::new());
        assert_ok!(
            tester
                .validate_resource_config("logdna_category", json!({"name": "c", "type": "views"}))
                .await
        );

        let err = tester
            .validate_resource_config("logdna_category", json!({"type": "views"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(ref d) if d.len() == 1));

        let err = tester
            .validate_provider_config(json!({"servicekey": "k", "url": "not a uri"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must be a valid uri"));
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid configuration value")];
        assert_error_contains(&diagnostics, "Invalid");
        assert_error_contains(&diagnostics, "configuration");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
