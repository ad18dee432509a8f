//! Convenience types shared by the mapping layer and the provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::schema::{has_errors, Diagnostic};

/// The LogDNA objects this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A saved view (`logdna_view`).
    View,
    /// A preset alert (`logdna_alert`).
    Alert,
    /// A view/board/screen category (`logdna_category`).
    Category,
}

impl ResourceKind {
    /// Every kind, in registration order.
    pub const ALL: [ResourceKind; 3] = [Self::View, Self::Alert, Self::Category];

    /// The host-facing resource type name.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::View => "logdna_view",
            Self::Alert => "logdna_alert",
            Self::Category => "logdna_category",
        }
    }

    /// The collection path under the API host, e.g. `v1/config/presetalert`.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::View => "v1/config/view",
            Self::Alert => "v1/config/presetalert",
            Self::Category => "v1/config/category",
        }
    }

    /// The path of a single object.
    pub fn object_path(self, id: &str) -> String {
        format!("{}/{}", self.collection_path(), id)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| ProviderError::UnknownResource(s.to_string()))
    }
}

/// A value produced by the mapping layer together with the diagnostics
/// raised while producing it.
///
/// The caller decides what to do with a value that carries error
/// diagnostics; the provider never sends such a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Marshaled<T> {
    /// The mapped value.
    pub value: T,
    /// Diagnostics accumulated while mapping.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Marshaled<T> {
    /// A value with the given diagnostics.
    pub fn with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    /// Transform the value, keeping the diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Marshaled<U> {
        Marshaled {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Move this value's diagnostics into `sink` and return the bare value.
    pub fn drain_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }

    /// The value if no error diagnostics were raised, otherwise every
    /// diagnostic (warnings included) as an [`ProviderError::InvalidConfig`].
    pub fn into_result(self) -> Result<T, ProviderError> {
        if self.has_errors() {
            Err(ProviderError::InvalidConfig(self.diagnostics))
        } else {
            Ok(self.value)
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}
