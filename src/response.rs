//! GET response decoding.
//!
//! The API hands back a flatter and looser shape than it accepts: ids live
//! under a different key per resource, booleans are sometimes strings, and
//! channels come as one list tagged by `integration`. This module reads those
//! bodies and rebuilds the resource state the configuration describes.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::channel::IntegrationType;
use crate::error::ApiError;
use crate::types::ResourceKind;

/// A channel as returned by GET.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ChannelResponse {
    /// Integration tag.
    #[serde(deserialize_with = "null_default")]
    pub integration: String,
    /// Email recipients.
    #[serde(deserialize_with = "null_default")]
    pub emails: Vec<String>,
    /// `true`, `false`, `"true"` or `"false"`.
    #[serde(deserialize_with = "flexible_bool")]
    pub immediate: Option<bool>,
    /// Presence or absence.
    #[serde(deserialize_with = "null_default")]
    pub operator: String,
    /// `true`, `false`, `"true"` or `"false"`.
    #[serde(deserialize_with = "flexible_bool")]
    pub terminal: Option<bool>,
    /// Counting window.
    #[serde(deserialize_with = "null_default")]
    pub triggerinterval: String,
    /// Match count.
    #[serde(deserialize_with = "null_default")]
    pub triggerlimit: i64,
    /// Email timezone.
    #[serde(deserialize_with = "null_default")]
    pub timezone: String,
    /// PagerDuty key.
    #[serde(deserialize_with = "null_default")]
    pub key: String,
    /// Slack or webhook URL.
    #[serde(deserialize_with = "null_default")]
    pub url: String,
    /// Webhook method.
    #[serde(deserialize_with = "null_default")]
    pub method: String,
    /// Webhook headers.
    #[serde(deserialize_with = "null_default")]
    pub headers: BTreeMap<String, String>,
    /// Webhook payload template, either parsed JSON or a string.
    #[serde(rename = "bodyTemplate")]
    pub body_template: Option<Value>,
}

impl ChannelResponse {
    fn common(&self) -> Map<String, Value> {
        let mut block = Map::new();
        block.insert("immediate".into(), json!(self.immediate.unwrap_or(false)));
        block.insert("operator".into(), json!(self.operator));
        block.insert("terminal".into(), json!(self.terminal.unwrap_or(true)));
        block.insert("triggerinterval".into(), json!(self.triggerinterval));
        block.insert("triggerlimit".into(), json!(self.triggerlimit));
        block
    }

    /// The state block of this channel, holding only the attributes of its
    /// integration.
    pub fn to_block(&self, integration: IntegrationType) -> Value {
        let mut block = self.common();
        match integration {
            IntegrationType::Email => {
                block.insert("emails".into(), json!(self.emails));
                block.insert("timezone".into(), json!(self.timezone));
            }
            IntegrationType::PagerDuty => {
                block.insert("key".into(), json!(self.key));
            }
            IntegrationType::Slack => {
                block.insert("url".into(), json!(self.url));
            }
            IntegrationType::Webhook => {
                block.insert("url".into(), json!(self.url));
                block.insert("method".into(), json!(self.method.to_lowercase()));
                block.insert("headers".into(), json!(self.headers));
                let template = render_body_template(self.body_template.as_ref());
                block.insert("bodytemplate".into(), json!(template));
            }
        }
        Value::Object(block)
    }
}

/// Render a returned body template as configuration text.
///
/// Parsed JSON comes back pretty-printed with two-space indentation and
/// sorted keys; a string is kept as is.
pub fn render_body_template(template: Option<&Value>) -> String {
    match template {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Regroup a flat channel list into the four per-integration blocks.
///
/// Every block key is present, empty when no channel of that integration
/// exists. Channels with an unknown integration are skipped.
pub fn channel_blocks(channels: &[ChannelResponse]) -> Map<String, Value> {
    let mut grouped: BTreeMap<&'static str, Vec<Value>> = IntegrationType::ALL
        .iter()
        .map(|integration| (integration.block_name(), Vec::new()))
        .collect();

    for channel in channels {
        match channel.integration.parse::<IntegrationType>() {
            Ok(integration) => grouped
                .entry(integration.block_name())
                .or_default()
                .push(channel.to_block(integration)),
            Err(_) => warn!(
                integration = %channel.integration,
                "skipping channel with unknown integration"
            ),
        }
    }

    grouped
        .into_iter()
        .map(|(name, blocks)| (name.to_string(), Value::Array(blocks)))
        .collect()
}

/// A view as returned by GET.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewResponse {
    /// Server-assigned id under its view key.
    #[serde(rename = "viewID")]
    pub view_id: Option<String>,
    /// Server-assigned id under the generic key.
    #[serde(rename = "id")]
    pub object_id: Option<String>,
    /// View name.
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    /// Search query.
    #[serde(deserialize_with = "null_default")]
    pub query: String,
    /// App facet.
    #[serde(deserialize_with = "null_default")]
    pub apps: Vec<String>,
    /// Category names.
    #[serde(deserialize_with = "null_default")]
    pub category: Vec<String>,
    /// Host facet.
    #[serde(deserialize_with = "null_default")]
    pub hosts: Vec<String>,
    /// Level facet.
    #[serde(deserialize_with = "null_default")]
    pub levels: Vec<String>,
    /// Tag facet.
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<String>,
    /// Channels.
    #[serde(deserialize_with = "null_default")]
    pub channels: Vec<ChannelResponse>,
}

impl ViewResponse {
    /// The server-assigned id, `viewID` first.
    pub fn id(&self) -> &str {
        first_id(&[&self.view_id, &self.object_id])
    }

    /// The view's resource state.
    pub fn into_state(self) -> Value {
        let mut state = channel_blocks(&self.channels);
        state.insert("id".into(), json!(self.id()));
        state.insert("name".into(), json!(self.name));
        state.insert("query".into(), json!(self.query));
        state.insert("apps".into(), json!(self.apps));
        state.insert("categories".into(), json!(self.category));
        state.insert("hosts".into(), json!(self.hosts));
        state.insert("levels".into(), json!(self.levels));
        state.insert("tags".into(), json!(self.tags));
        Value::Object(state)
    }
}

/// A preset alert as returned by GET.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AlertResponse {
    /// Server-assigned id under its preset key.
    #[serde(rename = "presetid")]
    pub preset_id: Option<String>,
    /// Server-assigned id under the generic key.
    #[serde(rename = "id")]
    pub object_id: Option<String>,
    /// Alert name.
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    /// Channels.
    #[serde(deserialize_with = "null_default")]
    pub channels: Vec<ChannelResponse>,
}

impl AlertResponse {
    /// The server-assigned id, `presetid` first.
    pub fn id(&self) -> &str {
        first_id(&[&self.preset_id, &self.object_id])
    }

    /// The alert's resource state.
    pub fn into_state(self) -> Value {
        let mut state = channel_blocks(&self.channels);
        state.insert("id".into(), json!(self.id()));
        state.insert("name".into(), json!(self.name));
        Value::Object(state)
    }
}

/// A category as returned by GET.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CategoryResponse {
    /// Server-assigned id.
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    /// Category name.
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    /// `views`, `boards` or `screens`.
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub category_type: String,
}

impl CategoryResponse {
    /// The category's resource state.
    pub fn into_state(self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "type": self.category_type,
        })
    }
}

/// Decode a GET body of `kind` into resource state.
pub fn decode_state(kind: ResourceKind, body: Value) -> Result<Value, ApiError> {
    let decode = |err: serde_json::Error| ApiError::Decode(format!("{} response: {}", kind, err));
    Ok(match kind {
        ResourceKind::View => {
            serde_json::from_value::<ViewResponse>(body).map_err(decode)?.into_state()
        }
        ResourceKind::Alert => {
            serde_json::from_value::<AlertResponse>(body).map_err(decode)?.into_state()
        }
        ResourceKind::Category => {
            serde_json::from_value::<CategoryResponse>(body).map_err(decode)?.into_state()
        }
    })
}

/// The id the API assigned in a create response, if it sent one.
pub fn created_id(kind: ResourceKind, body: &Value) -> Option<String> {
    let keys: &[&str] = match kind {
        ResourceKind::View => &["viewID", "id"],
        ResourceKind::Alert => &["presetid", "id"],
        ResourceKind::Category => &["id"],
    };
    keys.iter()
        .filter_map(|key| body.get(*key))
        .find_map(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn first_id<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .copied()
        .filter_map(Option::as_deref)
        .find(|id| !id.is_empty())
        .unwrap_or_default()
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flexible>::deserialize(deserializer)? {
        Some(Flexible::Bool(b)) => Some(b),
        Some(Flexible::Text(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert_body() -> Value {
        json!({
            "presetid": "abc123",
            "name": "test",
            "channels": [
                {
                    "integration": "webhook",
                    "immediate": "false",
                    "operator": "presence",
                    "terminal": "true",
                    "triggerinterval": "15m",
                    "triggerlimit": 15,
                    "url": "https://yourwebhook/endpoint",
                    "method": "POST",
                    "headers": {"hello": "test3", "test": "test2"},
                    "bodyTemplate": {
                        "fields": {
                            "summary": "Alert from {{ name }}",
                            "issuetype": {"name": "Bug"}
                        }
                    }
                },
                {
                    "integration": "email",
                    "emails": ["test@logdna.com"],
                    "immediate": false,
                    "operator": "absence",
                    "terminal": true,
                    "timezone": "Pacific/Samoa",
                    "triggerinterval": "15m",
                    "triggerlimit": 15
                },
                {
                    "integration": "pagerduty",
                    "key": "Your PagerDuty API key goes here",
                    "triggerinterval": "15m",
                    "triggerlimit": 15
                },
                {
                    "integration": "slack",
                    "url": "https://hooks.slack.com/services/identifier/secret",
                    "triggerinterval": "30m",
                    "triggerlimit": 20
                }
            ]
        })
    }

    #[test]
    fn test_alert_state_groups_channels() {
        let state = decode_state(ResourceKind::Alert, alert_body()).unwrap();

        assert_eq!(state["id"], "abc123");
        assert_eq!(state["name"], "test");
        for (block, attrs) in [
            ("email_channel", 7),
            ("pagerduty_channel", 6),
            ("slack_channel", 6),
            ("webhook_channel", 9),
        ] {
            let blocks = state[block].as_array().unwrap();
            assert_eq!(blocks.len(), 1, "{}", block);
            assert_eq!(blocks[0].as_object().unwrap().len(), attrs, "{}", block);
        }

        let email = &state["email_channel"][0];
        assert_eq!(email["emails"], json!(["test@logdna.com"]));
        assert_eq!(email["immediate"], false);
        assert_eq!(email["operator"], "absence");
        assert_eq!(email["terminal"], true);
        assert_eq!(email["timezone"], "Pacific/Samoa");
        assert_eq!(email["triggerlimit"], 15);
    }

    #[test]
    fn test_webhook_state() {
        let state = decode_state(ResourceKind::Alert, alert_body()).unwrap();
        let webhook = &state["webhook_channel"][0];

        assert_eq!(webhook["immediate"], false);
        assert_eq!(webhook["terminal"], true);
        assert_eq!(webhook["method"], "post");
        assert_eq!(webhook["headers"]["hello"], "test3");
        assert_eq!(
            webhook["bodytemplate"],
            "{\n  \"fields\": {\n    \"issuetype\": {\n      \"name\": \"Bug\"\n    },\n    \"summary\": \"Alert from {{ name }}\"\n  }\n}"
        );
    }

    #[test]
    fn test_body_template_string_kept() {
        assert_eq!(render_body_template(Some(&json!("{\"a\": 1}"))), "{\"a\": 1}");
        assert_eq!(render_body_template(Some(&Value::Null)), "");
        assert_eq!(render_body_template(None), "");
    }

    #[test]
    fn test_unknown_integration_skipped() {
        let mut body = alert_body();
        body["channels"]
            .as_array_mut()
            .unwrap()
            .push(json!({"integration": "sms", "triggerlimit": 1}));

        let state = decode_state(ResourceKind::Alert, body).unwrap();
        let total: usize = IntegrationType::ALL
            .iter()
            .map(|i| state[i.block_name()].as_array().unwrap().len())
            .sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_view_state() {
        let body = json!({
            "viewID": "view1",
            "name": "Email View",
            "query": "level:debug my query",
            "apps": ["app1", "app2"],
            "category": ["DEMOCATEGORY1"],
            "hosts": null,
            "channels": null
        });

        let state = decode_state(ResourceKind::View, body).unwrap();
        assert_eq!(state["id"], "view1");
        assert_eq!(state["categories"], json!(["DEMOCATEGORY1"]));
        assert_eq!(state["hosts"], json!([]));
        assert_eq!(state["levels"], json!([]));
        assert_eq!(state["email_channel"], json!([]));
        assert_eq!(state["webhook_channel"], json!([]));
    }

    #[test]
    fn test_both_id_keys_decode() {
        let state = decode_state(
            ResourceKind::View,
            json!({"viewID": "view1", "id": "other", "name": "v"}),
        )
        .unwrap();
        assert_eq!(state["id"], "view1");

        let state = decode_state(
            ResourceKind::Alert,
            json!({"presetid": "", "id": "p2", "name": "a", "channels": []}),
        )
        .unwrap();
        assert_eq!(state["id"], "p2");

        let state =
            decode_state(ResourceKind::Alert, json!({"presetid": null, "id": null})).unwrap();
        assert_eq!(state["id"], "");
    }

    #[test]
    fn test_category_state() {
        let state = decode_state(
            ResourceKind::Category,
            json!({"id": "cat1", "name": "DemoCategory1", "type": "views"}),
        )
        .unwrap();
        assert_eq!(state, json!({"id": "cat1", "name": "DemoCategory1", "type": "views"}));
    }

    #[test]
    fn test_decode_error() {
        let err = decode_state(ResourceKind::View, json!({"name": 5})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(msg) if msg.starts_with("logdna_view response")));
    }

    #[test]
    fn test_created_id() {
        assert_eq!(
            created_id(ResourceKind::Alert, &json!({"presetid": "p1"})).as_deref(),
            Some("p1")
        );
        assert_eq!(created_id(ResourceKind::View, &json!({"id": "v1"})).as_deref(), Some("v1"));
        assert_eq!(created_id(ResourceKind::Category, &json!({"id": 42})).as_deref(), Some("42"));
        assert_eq!(created_id(ResourceKind::View, &json!({"viewID": ""})), None);
    }

    #[test]
    fn test_flexible_bool() {
        let channel: ChannelResponse =
            serde_json::from_value(json!({"immediate": "TRUE", "terminal": null})).unwrap();
        assert_eq!(channel.immediate, Some(true));
        assert_eq!(channel.terminal, None);
    }
}
