//! The LogDNA provider.
//!
//! Every write follows the same path: validate the configuration against the
//! resource schema, build the request body, and only if no error diagnostic
//! was raised send it. State is always taken from a GET after the write.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{ApiRequest, ConfigApi, HttpClient};
use crate::config::ProviderConfig;
use crate::error::{ApiError, ProviderError};
use crate::request::{build_request, ResourceRequest};
use crate::resources::{
    check_resource_rules, provider_config_schema, provider_schema, resource_schema,
};
use crate::response::{created_id, decode_state};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, ResourceKind};
use crate::validation::validate;

/// Manages `logdna_view`, `logdna_alert` and `logdna_category`.
#[derive(Default)]
pub struct LogdnaProvider {
    api: RwLock<Option<Arc<dyn ConfigApi>>>,
}

impl LogdnaProvider {
    /// An unconfigured provider; `configure` must run before any resource
    /// operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider already bound to `api`.
    pub fn with_api(api: Arc<dyn ConfigApi>) -> Self {
        Self {
            api: RwLock::new(Some(api)),
        }
    }

    async fn api(&self) -> Result<Arc<dyn ConfigApi>, ProviderError> {
        self.api.read().await.clone().ok_or(ProviderError::NotConfigured)
    }

    /// Every diagnostic `config` raises for `kind`.
    ///
    /// Schema and resource rules run first; the body is only built when they
    /// pass, so a bad value is reported once.
    pub fn check_config(kind: ResourceKind, config: &Value) -> Vec<Diagnostic> {
        let (_, diagnostics) = Self::checked_body(kind, config);
        diagnostics
    }

    fn checked_body(
        kind: ResourceKind,
        config: &Value,
    ) -> (Option<ResourceRequest>, Vec<Diagnostic>) {
        let mut diagnostics = validate(&resource_schema(kind), config);
        diagnostics.extend(check_resource_rules(kind, config));
        if has_errors(&diagnostics) {
            return (None, diagnostics);
        }
        let request = build_request(kind, config).drain_into(&mut diagnostics);
        (Some(request), diagnostics)
    }

    /// The serialized body for `config`, or every diagnostic that blocks it.
    pub fn request_body(kind: ResourceKind, config: &Value) -> Result<String, ProviderError> {
        match Self::checked_body(kind, config) {
            (Some(request), diagnostics) if !has_errors(&diagnostics) => Ok(request.to_body()?),
            (_, diagnostics) => {
                warn!(
                    resource_type = %kind,
                    diagnostics = diagnostics.len(),
                    "configuration has errors, request not sent"
                );
                Err(ProviderError::InvalidConfig(diagnostics))
            }
        }
    }

    async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Value, ProviderError> {
        let api = self.api().await?;
        match api.send(ApiRequest::get(kind.object_path(id))).await {
            Ok(body) => Ok(decode_state(kind, body)?),
            Err(err) if err.is_not_found() => {
                Err(ProviderError::NotFound(format!("{} {}", kind, id)))
            }
            Err(err) => {
                error!(resource_type = %kind, id, error = %err, "read failed");
                Err(err.into())
            }
        }
    }
}

fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation("state has no id".to_string()))
}

#[async_trait::async_trait]
impl ProviderService for LogdnaProvider {
    fn schema(&self) -> ProviderSchema {
        provider_schema()
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&provider_config_schema(), &config))
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&provider_config_schema(), &config);
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "provider configuration has errors");
            return Ok(diagnostics);
        }

        let config = ProviderConfig::from_value(config)?;
        let client = HttpClient::new(&config)?;
        info!(url = %client.base_url(), "provider configured");
        *self.api.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let diagnostics = Self::check_config(kind, &config);
        debug!(diagnostics = diagnostics.len(), "validated resource config");
        Ok(diagnostics)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let body = Self::request_body(kind, &planned_state)?;
        let api = self.api().await?;

        let response = api
            .send(ApiRequest::post(kind.collection_path(), body))
            .await
            .map_err(|err| {
                error!(error = %err, "create failed");
                err
            })?;
        let id = created_id(kind, &response)
            .ok_or_else(|| ApiError::Decode(format!("{} create response has no id", kind)))?;
        info!(id = %id, "created");

        self.fetch(kind, &id).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let id = state_id(&current_state)?;
        self.fetch(kind, id).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let id = state_id(&prior_state)?;
        let body = Self::request_body(kind, &planned_state)?;
        let api = self.api().await?;

        api.send(ApiRequest::put(kind.object_path(id), body))
            .await
            .map_err(|err| {
                error!(id, error = %err, "update failed");
                err
            })?;
        info!(id, "updated");

        self.fetch(kind, id).await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let id = state_id(&current_state)?;
        let api = self.api().await?;

        match api.send(ApiRequest::delete(kind.object_path(id))).await {
            Ok(_) => {
                info!(id, "deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(id, "already gone");
                Ok(())
            }
            Err(err) => {
                error!(id, error = %err, "delete failed");
                Err(err.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let kind: ResourceKind = resource_type.parse()?;
        let state = self.fetch(kind, id).await?;
        info!(id, "imported");
        Ok(vec![ImportedResource::new(kind.type_name(), state)])
    }
}
