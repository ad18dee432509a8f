//! LogDNA provider
//!
//! Exposes LogDNA views, preset alerts and categories as declarative
//! resources. A resource's configuration is validated against its schema,
//! turned into the body the LogDNA configuration API accepts, sent, and the
//! object the API returns is read back into state.
//!
//! # Overview
//!
//! - **Schema types** ([`schema`]): resource shapes and the constraints
//!   [`validation`] enforces before anything is sent
//! - **Channel mapping** ([`channel`]): email, PagerDuty, Slack and webhook
//!   notification channels in their API request form
//! - **Request bodies** ([`request`]) and **response decoding** ([`response`]),
//!   kept apart because the API reads and writes different shapes
//! - **API client** ([`client`]): the [`ConfigApi`] seam and its HTTPS
//!   implementation
//! - **Provider** ([`provider`]): [`LogdnaProvider`], implementing
//!   [`ProviderService`]
//! - **Logging** ([`logging`]): `tracing` to stderr
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use terraform_provider_logdna::{init_logging, LogdnaProvider, ProviderService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = LogdnaProvider::new();
//!     provider.configure(json!({"servicekey": "..."})).await?;
//!
//!     let state = provider
//!         .create(
//!             "logdna_alert",
//!             json!({
//!                 "name": "errors",
//!                 "email_channel": [{
//!                     "emails": ["oncall@example.com"],
//!                     "triggerlimit": 15
//!                 }]
//!             }),
//!         )
//!         .await?;
//!     tracing::info!(id = %state["id"], "alert created");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod request;
pub mod resources;
pub mod response;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use channel::{Channel, ChannelRequest, IntegrationType, MappingError};
pub use client::{ApiRequest, ConfigApi, HttpClient};
pub use config::{ProviderConfig, DEFAULT_API_URL};
pub use error::{ApiError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::LogdnaProvider;
pub use schema::{Diagnostic, ProviderSchema};
pub use service::ProviderService;
pub use types::{ImportedResource, Marshaled, ResourceKind};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
