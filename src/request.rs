//! Create/update request bodies.
//!
//! These shapes are what the API accepts on POST and PUT. They do not match
//! what it returns on GET, which is why [`crate::response`] has its own
//! types. Empty fields are left out of the body entirely.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::channel::{aggregate_channels, ChannelRequest};
use crate::schema::Diagnostic;
use crate::types::{Marshaled, ResourceKind};

/// Body of a view create/update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewRequest {
    /// App facet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
    /// Category names; the API calls this field `category`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    /// Aggregated channels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelRequest>,
    /// Host facet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    /// Level facet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<String>,
    /// View name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Search query.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query: String,
    /// Tag facet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Body of a preset alert create/update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AlertRequest {
    /// Alert name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Aggregated channels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelRequest>,
}

/// What a category groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Saved views.
    Views,
    /// Boards.
    Boards,
    /// Screens.
    Screens,
}

impl CategoryType {
    /// Accepted configuration values.
    pub const NAMES: [&'static str; 3] = ["views", "boards", "screens"];
}

/// Body of a category create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRequest {
    /// Category name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Category type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category_type: Option<CategoryType>,
}

/// A request body for any managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourceRequest {
    /// View body.
    View(ViewRequest),
    /// Alert body.
    Alert(AlertRequest),
    /// Category body.
    Category(CategoryRequest),
}

impl ResourceRequest {
    /// Serialize to the exact text sent on the wire.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Keep the distinct non-empty string elements of a list attribute, in
/// first-seen order.
///
/// Anything else (numbers, nulls, empty strings, repeats, a non-list value)
/// is dropped without a diagnostic.
pub fn list_to_strings(value: Option<&Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty() && seen.insert(*s))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_attr(config: &Value, name: &str) -> String {
    config
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Build a view body from its configuration.
pub fn build_view(config: &Value) -> Marshaled<ViewRequest> {
    aggregate_channels(config).map(|channels| ViewRequest {
        apps: list_to_strings(config.get("apps")),
        category: list_to_strings(config.get("categories")),
        channels,
        hosts: list_to_strings(config.get("hosts")),
        levels: list_to_strings(config.get("levels")),
        name: string_attr(config, "name"),
        query: string_attr(config, "query"),
        tags: list_to_strings(config.get("tags")),
    })
}

/// Build an alert body from its configuration.
pub fn build_alert(config: &Value) -> Marshaled<AlertRequest> {
    aggregate_channels(config).map(|channels| AlertRequest {
        name: string_attr(config, "name"),
        channels,
    })
}

/// Build a category body from its configuration.
pub fn build_category(config: &Value) -> Marshaled<CategoryRequest> {
    let mut diagnostics = Vec::new();
    let category_type = match config.get("type") {
        None | Some(Value::Null) => None,
        Some(raw) => match serde_json::from_value::<CategoryType>(raw.clone()) {
            Ok(t) => Some(t),
            Err(err) => {
                diagnostics.push(
                    Diagnostic::error("Invalid category type")
                        .with_detail(err.to_string())
                        .with_attribute("type"),
                );
                None
            }
        },
    };

    Marshaled::with_diagnostics(
        CategoryRequest {
            name: string_attr(config, "name"),
            category_type,
        },
        diagnostics,
    )
}

/// Build the body for `kind` from its configuration.
pub fn build_request(kind: ResourceKind, config: &Value) -> Marshaled<ResourceRequest> {
    let built = match kind {
        ResourceKind::View => build_view(config).map(ResourceRequest::View),
        ResourceKind::Alert => build_alert(config).map(ResourceRequest::Alert),
        ResourceKind::Category => build_category(config).map(ResourceRequest::Category),
    };
    debug!(
        kind = %kind,
        diagnostics = built.diagnostics.len(),
        "built request body"
    );
    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::IntegrationType;
    use serde_json::json;

    fn view_config() -> Value {
        json!({
            "name": "Email PagerDuty and Webhook View",
            "query": "level:debug my query",
            "apps": ["app1", "app2"],
            "categories": ["DemoCategory1", "DemoCategory2"],
            "hosts": ["host1", "host2"],
            "levels": ["fatal", "critical"],
            "tags": ["tags1", "tags2"],
            "pagerduty_channel": [{
                "immediate": false,
                "key": "Your PagerDuty API key goes here",
                "operator": "presence",
                "terminal": true,
                "triggerinterval": "15m",
                "triggerlimit": 15
            }],
            "webhook_channel": [{
                "bodytemplate": "{\"hello\": \"test1\", \"num\": 2}",
                "headers": {"hello": "test3", "test": "test2"},
                "immediate": false,
                "method": "post",
                "operator": "presence",
                "terminal": true,
                "triggerinterval": "15m",
                "triggerlimit": 15,
                "url": "https://yourwebhook/endpoint"
            }],
            "email_channel": [{
                "emails": ["test@logdna.com"],
                "immediate": false,
                "operator": "absence",
                "terminal": true,
                "timezone": "Pacific/Samoa",
                "triggerinterval": "15m",
                "triggerlimit": 15
            }]
        })
    }

    #[test]
    fn test_list_to_strings() {
        let value = json!(["a", 1, "", null, "b", {"c": "d"}, "a"]);
        assert_eq!(list_to_strings(Some(&value)), vec!["a", "b"]);
        assert!(list_to_strings(None).is_empty());
        assert!(list_to_strings(Some(&json!("not a list"))).is_empty());
    }

    #[test]
    fn test_build_view() {
        let built = build_view(&view_config());
        assert!(built.diagnostics.is_empty());

        let view = built.value;
        assert_eq!(view.name, "Email PagerDuty and Webhook View");
        assert_eq!(view.category, vec!["DemoCategory1", "DemoCategory2"]);
        let integrations: Vec<_> = view.channels.iter().map(|c| c.integration).collect();
        assert_eq!(
            integrations,
            vec![IntegrationType::Email, IntegrationType::PagerDuty, IntegrationType::Webhook]
        );

        let body = serde_json::to_value(&view).unwrap();
        assert_eq!(body["category"], json!(["DemoCategory1", "DemoCategory2"]));
        assert!(body.get("categories").is_none());
        assert_eq!(body["channels"][2]["bodyTemplate"], json!({"hello": "test1", "num": 2}));
    }

    #[test]
    fn test_facets_drop_repeats_keeping_first() {
        let built = build_view(&json!({
            "name": "v",
            "hosts": ["web2", "web1", "web2", "db", "web1"],
            "tags": ["a", "b", "a"]
        }));

        assert_eq!(built.value.hosts, vec!["web2", "web1", "db"]);
        assert_eq!(built.value.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_build_view_omits_empty_fields() {
        let built = build_view(&json!({
            "name": "bare",
            "query": "",
            "apps": ["", 7],
            "hosts": null
        }));

        let body = ResourceRequest::View(built.value).to_body().unwrap();
        assert_eq!(body, r#"{"name":"bare"}"#);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = view_config();
        let first = build_request(ResourceKind::View, &config).value.to_body().unwrap();
        let second = build_request(ResourceKind::View, &config).value.to_body().unwrap();
        assert_eq!(first, second);
        assert!(first.contains(r#""bodyTemplate":{"hello": "test1", "num": 2}"#));
    }

    #[test]
    fn test_build_alert() {
        let mut config = view_config();
        config["name"] = json!("Alert");
        let built = build_request(ResourceKind::Alert, &config);
        assert!(!built.has_errors());

        let body = serde_json::to_value(&built.value).unwrap();
        assert_eq!(body["name"], "Alert");
        assert_eq!(body["channels"].as_array().unwrap().len(), 3);
        // facets are not part of an alert
        assert!(body.get("apps").is_none());
        assert!(body.get("query").is_none());
    }

    #[test]
    fn test_build_alert_carries_channel_diagnostics() {
        let config = json!({
            "name": "Alert",
            "webhook_channel": [{
                "bodytemplate": "{\"test\": }",
                "triggerlimit": 15,
                "url": "https://yourwebhook/endpoint"
            }]
        });

        let built = build_request(ResourceKind::Alert, &config);
        assert!(built.has_errors());
        assert_eq!(built.diagnostics.len(), 1);
    }

    #[test]
    fn test_build_category() {
        let config = json!({"name": "DemoCategory1", "type": "views"});
        let built = build_request(ResourceKind::Category, &config);
        assert!(built.diagnostics.is_empty());
        assert_eq!(
            built.value.to_body().unwrap(),
            r#"{"name":"DemoCategory1","type":"views"}"#
        );

        let built = build_category(&json!({"name": "x", "type": "dashboards"}));
        assert!(built.has_errors());
        assert_eq!(built.diagnostics[0].attribute.as_deref(), Some("type"));
        assert!(built.value.category_type.is_none());
    }
}
