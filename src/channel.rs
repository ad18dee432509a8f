//! Notification channel mapping.
//!
//! A view or alert declares its channels in four repeatable blocks
//! (`email_channel`, `pagerduty_channel`, `slack_channel`, `webhook_channel`).
//! Each block instance is decoded into a typed [`Channel`] variant carrying
//! only the fields valid for its integration, then rendered into the single
//! flat [`ChannelRequest`] shape the LogDNA API accepts on create/update.
//!
//! The wire shape deliberately differs from what the API returns on GET; see
//! [`crate::response`] for the opposite direction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::schema::Diagnostic;
use crate::types::Marshaled;

/// The integration a channel notifies through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationType {
    /// Email recipients.
    Email,
    /// A PagerDuty service.
    PagerDuty,
    /// A Slack incoming webhook.
    Slack,
    /// An arbitrary HTTP endpoint.
    Webhook,
}

impl IntegrationType {
    /// Every integration, in the order channels are aggregated.
    pub const ALL: [IntegrationType; 4] =
        [Self::Email, Self::PagerDuty, Self::Slack, Self::Webhook];

    /// The tag used on the wire (`integration` field).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::PagerDuty => "pagerduty",
            Self::Slack => "slack",
            Self::Webhook => "webhook",
        }
    }

    /// The configuration block holding channels of this integration.
    pub fn block_name(self) -> &'static str {
        match self {
            Self::Email => "email_channel",
            Self::PagerDuty => "pagerduty_channel",
            Self::Slack => "slack_channel",
            Self::Webhook => "webhook_channel",
        }
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|integration| integration.as_str() == s)
            .ok_or_else(|| MappingError::UnsupportedIntegration(s.to_string()))
    }
}

/// Whether a channel fires on the presence or the absence of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Fire when matching lines arrive.
    #[default]
    Presence,
    /// Fire when matching lines stop arriving.
    Absence,
}

impl Operator {
    /// Accepted configuration values.
    pub const NAMES: [&'static str; 2] = ["presence", "absence"];
}

/// The window over which `triggerlimit` is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerInterval {
    /// 15 minutes.
    #[default]
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// 30 minutes.
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// 1 hour.
    #[serde(rename = "1h")]
    OneHour,
    /// 6 hours.
    #[serde(rename = "6h")]
    SixHours,
    /// 12 hours.
    #[serde(rename = "12h")]
    TwelveHours,
    /// 24 hours.
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl TriggerInterval {
    /// Accepted configuration values.
    pub const NAMES: [&'static str; 6] = ["15m", "30m", "1h", "6h", "12h", "24h"];
}

/// HTTP method a webhook channel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMethod {
    /// POST
    #[default]
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// GET
    Get,
    /// DELETE
    Delete,
}

impl WebhookMethod {
    /// Accepted configuration values.
    pub const NAMES: [&'static str; 5] = ["post", "put", "patch", "get", "delete"];
}

/// Number of matches within the interval that fires the channel.
///
/// Always a whole number within [`TriggerLimit::MIN`]`..=`[`TriggerLimit::MAX`].
/// Decoding goes through `f64` so `15.0` is read like `15`, matching schema
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "i64")]
pub struct TriggerLimit(u32);

impl TriggerLimit {
    /// Smallest accepted limit.
    pub const MIN: i64 = 1;
    /// Largest accepted limit.
    pub const MAX: i64 = 100_000;

    /// The limit as a plain number.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A trigger limit outside the accepted range or not a whole number.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("triggerlimit must be between 1 and 100,000 inclusive, got {0}")]
pub struct TriggerLimitOutOfRange(pub f64);

impl TryFrom<f64> for TriggerLimit {
    type Error = TriggerLimitOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() == 0.0 && (Self::MIN as f64..=Self::MAX as f64).contains(&value) {
            Ok(Self(value as u32))
        } else {
            Err(TriggerLimitOutOfRange(value))
        }
    }
}

impl TryFrom<i64> for TriggerLimit {
    type Error = TriggerLimitOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_from(value as f64)
    }
}

impl From<TriggerLimit> for i64 {
    fn from(limit: TriggerLimit) -> Self {
        i64::from(limit.0)
    }
}

/// Trigger settings shared by every integration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trigger {
    /// Send as soon as the limit is hit instead of at the end of the interval.
    #[serde(default)]
    pub immediate: bool,
    /// Presence or absence.
    #[serde(default)]
    pub operator: Operator,
    /// Send at the end of the interval.
    #[serde(default = "default_terminal")]
    pub terminal: bool,
    /// Counting window.
    #[serde(default)]
    pub triggerinterval: TriggerInterval,
    /// Match count that fires the channel.
    pub triggerlimit: TriggerLimit,
}

fn default_terminal() -> bool {
    true
}

/// An `email_channel` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailChannel {
    /// Recipients.
    pub emails: Vec<String>,
    /// Timezone used to render timestamps in the message.
    #[serde(default)]
    pub timezone: String,
    /// Shared trigger settings.
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// A `pagerduty_channel` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PagerDutyChannel {
    /// PagerDuty integration key.
    pub key: String,
    /// Shared trigger settings.
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// A `slack_channel` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackChannel {
    /// Slack incoming webhook URL.
    pub url: String,
    /// Shared trigger settings.
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// A `webhook_channel` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookChannel {
    /// Endpoint to call.
    pub url: String,
    /// HTTP method.
    #[serde(default)]
    pub method: WebhookMethod,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request payload template: raw JSON text, kept verbatim.
    #[serde(default)]
    pub bodytemplate: String,
    /// Shared trigger settings.
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// One declared channel, typed by its integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Email channel.
    Email(EmailChannel),
    /// PagerDuty channel.
    PagerDuty(PagerDutyChannel),
    /// Slack channel.
    Slack(SlackChannel),
    /// Webhook channel.
    Webhook(WebhookChannel),
}

impl Channel {
    /// Decode a raw configuration block as a channel of `integration`.
    ///
    /// Null attributes count as unset. Attributes belonging to other
    /// integrations are ignored.
    pub fn decode(integration: IntegrationType, block: &Value) -> Result<Self, MappingError> {
        let block = Value::Object(strip_nulls(block, integration)?);
        let decode_err = |source| MappingError::Decode {
            block: integration.block_name(),
            source,
        };

        Ok(match integration {
            IntegrationType::Email => {
                Self::Email(serde_json::from_value(block).map_err(decode_err)?)
            }
            IntegrationType::PagerDuty => {
                Self::PagerDuty(serde_json::from_value(block).map_err(decode_err)?)
            }
            IntegrationType::Slack => {
                Self::Slack(serde_json::from_value(block).map_err(decode_err)?)
            }
            IntegrationType::Webhook => {
                Self::Webhook(serde_json::from_value(block).map_err(decode_err)?)
            }
        })
    }

    /// The integration of this channel.
    pub fn integration(&self) -> IntegrationType {
        match self {
            Self::Email(_) => IntegrationType::Email,
            Self::PagerDuty(_) => IntegrationType::PagerDuty,
            Self::Slack(_) => IntegrationType::Slack,
            Self::Webhook(_) => IntegrationType::Webhook,
        }
    }

    fn trigger(&self) -> &Trigger {
        match self {
            Self::Email(c) => &c.trigger,
            Self::PagerDuty(c) => &c.trigger,
            Self::Slack(c) => &c.trigger,
            Self::Webhook(c) => &c.trigger,
        }
    }

    /// Render the API request shape.
    ///
    /// A webhook body template that is not valid JSON yields an error
    /// diagnostic and an empty template; the channel itself is still returned.
    pub fn to_request(&self) -> Marshaled<ChannelRequest> {
        let trigger = self.trigger();
        let mut request = ChannelRequest {
            body_template: String::new(),
            emails: Vec::new(),
            headers: BTreeMap::new(),
            immediate: trigger.immediate,
            integration: self.integration(),
            key: String::new(),
            method: None,
            operator: trigger.operator,
            terminal: trigger.terminal,
            triggerinterval: trigger.triggerinterval,
            triggerlimit: trigger.triggerlimit,
            timezone: String::new(),
            url: String::new(),
        };
        let mut diagnostics = Vec::new();

        match self {
            Self::Email(c) => {
                request.emails = c.emails.clone();
                request.timezone = c.timezone.clone();
            }
            Self::PagerDuty(c) => {
                request.key = c.key.clone();
            }
            Self::Slack(c) => {
                request.url = c.url.clone();
            }
            Self::Webhook(c) => {
                request.url = c.url.clone();
                request.method = Some(c.method);
                request.headers = c.headers.clone();
                if !c.bodytemplate.is_empty() {
                    // Only checked; the text is sent as written.
                    match serde_json::from_str::<&RawValue>(&c.bodytemplate) {
                        Ok(_) => request.body_template = c.bodytemplate.clone(),
                        Err(err) => diagnostics.push(
                            MappingError::InvalidBodyTemplate(err).into_diagnostic(None),
                        ),
                    }
                }
            }
        }

        Marshaled::with_diagnostics(request, diagnostics)
    }
}

/// A channel as the API expects it in create/update bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRequest {
    /// Webhook payload template, embedded as raw JSON.
    #[serde(
        rename = "bodyTemplate",
        skip_serializing_if = "String::is_empty",
        serialize_with = "serialize_raw_json"
    )]
    pub body_template: String,
    /// Email recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    /// Webhook headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Sent as `"true"`/`"false"`.
    #[serde(serialize_with = "serialize_bool_string")]
    pub immediate: bool,
    /// Integration discriminator.
    pub integration: IntegrationType,
    /// PagerDuty key.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// Webhook method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<WebhookMethod>,
    /// Presence or absence.
    pub operator: Operator,
    /// Sent as `"true"`/`"false"`.
    #[serde(serialize_with = "serialize_bool_string")]
    pub terminal: bool,
    /// Counting window.
    pub triggerinterval: TriggerInterval,
    /// Match count that fires the channel.
    pub triggerlimit: TriggerLimit,
    /// Email timezone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timezone: String,
    /// Slack or webhook URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

fn serialize_raw_json<S: Serializer>(raw: &str, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(raw.to_owned()).map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}

fn serialize_bool_string<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Failures raised while mapping a channel block.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The integration tag is not one this provider knows.
    #[error("unsupported integration channel: {0}")]
    UnsupportedIntegration(String),

    /// The webhook body template is not well-formed JSON.
    #[error("bodytemplate is not a valid JSON string")]
    InvalidBodyTemplate(#[source] serde_json::Error),

    /// The block does not have the attributes its integration requires.
    #[error("invalid {block} configuration")]
    Decode {
        /// Name of the offending block.
        block: &'static str,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

impl MappingError {
    /// Render as an error diagnostic, optionally pinned to an attribute path.
    pub fn into_diagnostic(self, attribute: Option<&str>) -> Diagnostic {
        let detail = match &self {
            Self::UnsupportedIntegration(tag) => format!(
                "Unrecognized integration \"{}\", expected one of: {}",
                tag,
                IntegrationType::ALL.map(IntegrationType::as_str).join(", ")
            ),
            Self::InvalidBodyTemplate(err) => err.to_string(),
            Self::Decode { source, .. } => source.to_string(),
        };
        let diagnostic = Diagnostic::error(self.to_string()).with_detail(detail);
        match attribute {
            Some(path) => diagnostic.with_attribute(path),
            None => diagnostic,
        }
    }
}

fn strip_nulls(
    block: &Value,
    integration: IntegrationType,
) -> Result<Map<String, Value>, MappingError> {
    match block {
        Value::Object(map) => Ok(map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        other => Err(MappingError::Decode {
            block: integration.block_name(),
            source: serde::de::Error::custom(format!("expected an object, got {}", other)),
        }),
    }
}

/// Map one channel block whose integration is given as a raw tag.
///
/// An unrecognized tag produces exactly one diagnostic and no channel.
pub fn map_channel(tag: &str, block: &Value, attribute: &str) -> Marshaled<Option<ChannelRequest>> {
    match tag.parse::<IntegrationType>() {
        Ok(integration) => map_block(integration, block, attribute),
        Err(err) => Marshaled::with_diagnostics(None, vec![err.into_diagnostic(Some(attribute))]),
    }
}

fn map_block(
    integration: IntegrationType,
    block: &Value,
    attribute: &str,
) -> Marshaled<Option<ChannelRequest>> {
    match Channel::decode(integration, block) {
        Ok(channel) => {
            let mapped = channel.to_request();
            let diagnostics = mapped
                .diagnostics
                .into_iter()
                .map(|d| d.with_attribute(format!("{}.bodytemplate", attribute)))
                .collect();
            debug!(integration = %integration, attribute, "mapped channel");
            Marshaled::with_diagnostics(Some(mapped.value), diagnostics)
        }
        Err(err) => Marshaled::with_diagnostics(None, vec![err.into_diagnostic(Some(attribute))]),
    }
}

/// Collect every declared channel of a resource into one ordered list.
///
/// Order is integration-major (email, pagerduty, slack, webhook) and then
/// declaration order within each block, so identical input always yields
/// the same list.
pub fn aggregate_channels(config: &Value) -> Marshaled<Vec<ChannelRequest>> {
    let mut channels = Vec::new();
    let mut diagnostics = Vec::new();

    for integration in IntegrationType::ALL {
        let blocks = match config.get(integration.block_name()) {
            Some(Value::Array(blocks)) => blocks.as_slice(),
            _ => continue,
        };
        for (i, block) in blocks.iter().enumerate() {
            let attribute = format!("{}.{}", integration.block_name(), i);
            let mapped = map_block(integration, block, &attribute);
            if let Some(channel) = mapped.drain_into(&mut diagnostics) {
                channels.push(channel);
            }
        }
    }

    Marshaled::with_diagnostics(channels, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_error_contains;
    use serde_json::json;

    fn email_block() -> Value {
        json!({
            "emails": ["test@logdna.com"],
            "immediate": false,
            "operator": "absence",
            "terminal": true,
            "timezone": "Pacific/Samoa",
            "triggerinterval": "15m",
            "triggerlimit": 15
        })
    }

    fn webhook_block() -> Value {
        json!({
            "bodytemplate": "{\"fields\": {\"summary\": \"Alert from {{ name }}\"}}",
            "headers": {"test": "test2", "hello": "test3"},
            "immediate": false,
            "method": "post",
            "operator": "presence",
            "terminal": true,
            "triggerinterval": "15m",
            "triggerlimit": 15,
            "url": "https://yourwebhook/endpoint"
        })
    }

    #[test]
    fn test_email_channel_request() {
        let mapped = map_channel("email", &email_block(), "email_channel.0");
        assert!(mapped.diagnostics.is_empty());

        let encoded = serde_json::to_value(mapped.value.unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "emails": ["test@logdna.com"],
                "immediate": "false",
                "integration": "email",
                "operator": "absence",
                "terminal": "true",
                "timezone": "Pacific/Samoa",
                "triggerinterval": "15m",
                "triggerlimit": 15
            })
        );
    }

    #[test]
    fn test_pagerduty_channel_request() {
        let block = json!({
            "key": "Your PagerDuty API key goes here",
            "triggerlimit": 15,
            "url": "https://ignored.example.com"
        });
        let mapped = map_channel("pagerduty", &block, "pagerduty_channel.0");
        assert!(mapped.diagnostics.is_empty());

        let encoded = serde_json::to_value(mapped.value.unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "immediate": "false",
                "integration": "pagerduty",
                "key": "Your PagerDuty API key goes here",
                "operator": "presence",
                "terminal": "true",
                "triggerinterval": "15m",
                "triggerlimit": 15
            })
        );
    }

    #[test]
    fn test_slack_channel_request() {
        let block = json!({
            "immediate": null,
            "operator": "absence",
            "triggerinterval": "30m",
            "triggerlimit": 15,
            "url": "https://hooks.slack.com/services/identifier/secret"
        });
        let request = map_channel("slack", &block, "slack_channel.0").value.unwrap();

        assert_eq!(request.integration, IntegrationType::Slack);
        assert_eq!(request.triggerinterval, TriggerInterval::ThirtyMinutes);
        assert_eq!(request.url, "https://hooks.slack.com/services/identifier/secret");
        assert!(request.emails.is_empty());
        assert!(request.method.is_none());
    }

    #[test]
    fn test_webhook_body_template_kept_verbatim() {
        let mapped = map_channel("webhook", &webhook_block(), "webhook_channel.0");
        assert!(mapped.diagnostics.is_empty());

        let request = mapped.value.unwrap();
        assert_eq!(
            request.body_template,
            "{\"fields\": {\"summary\": \"Alert from {{ name }}\"}}"
        );
        assert_eq!(request.method, Some(WebhookMethod::Post));
        assert_eq!(request.headers.len(), 2);

        // Embedded as JSON, exactly as written, not as a quoted string.
        let body = serde_json::to_string(&request).unwrap();
        assert!(body.starts_with(
            "{\"bodyTemplate\":{\"fields\": {\"summary\": \"Alert from {{ name }}\"}},"
        ));
        assert!(body.contains("\"headers\":{\"hello\":\"test3\",\"test\":\"test2\"}"));
    }

    #[test]
    fn test_webhook_invalid_body_template() {
        let mut block = webhook_block();
        block["bodytemplate"] = json!("{\"test\": }");

        let mapped = map_channel("webhook", &block, "webhook_channel.0");
        assert_eq!(mapped.diagnostics.len(), 1);
        assert_error_contains(&mapped.diagnostics, "not a valid JSON string");
        assert_eq!(
            mapped.diagnostics[0].attribute.as_deref(),
            Some("webhook_channel.0.bodytemplate")
        );
        assert!(mapped.diagnostics[0].detail.is_some());

        let request = mapped.value.unwrap();
        assert!(request.body_template.is_empty());
        let encoded = serde_json::to_value(&request).unwrap();
        assert!(encoded.get("bodyTemplate").is_none());
    }

    #[test]
    fn test_webhook_empty_body_template_is_omitted() {
        let mut block = webhook_block();
        block["bodytemplate"] = json!("");

        let mapped = map_channel("webhook", &block, "webhook_channel.0");
        assert!(mapped.diagnostics.is_empty());
        assert!(mapped.value.unwrap().body_template.is_empty());
    }

    #[test]
    fn test_unsupported_integration() {
        let mapped = map_channel("sms", &email_block(), "channels.0");

        assert!(mapped.value.is_none());
        assert_eq!(mapped.diagnostics.len(), 1);
        assert!(mapped.diagnostics[0].summary.contains("unsupported integration channel"));
        assert!(mapped.diagnostics[0].summary.contains("sms"));
    }

    #[test]
    fn test_trigger_limit_out_of_range() {
        for integration in IntegrationType::ALL {
            let mut block = match integration {
                IntegrationType::Email => email_block(),
                IntegrationType::Webhook => webhook_block(),
                IntegrationType::PagerDuty => json!({"key": "k", "triggerlimit": 15}),
                IntegrationType::Slack => {
                    json!({"url": "https://hooks.slack.com/x", "triggerlimit": 15})
                }
            };
            block["triggerlimit"] = json!(0);

            let mapped = map_channel(integration.as_str(), &block, "c.0");
            assert!(mapped.value.is_none());
            assert_eq!(mapped.diagnostics.len(), 1);
            let detail = mapped.diagnostics[0].detail.as_deref().unwrap();
            assert!(
                detail.contains("must be between 1 and 100,000 inclusive"),
                "unexpected detail: {}",
                detail
            );
        }
    }

    #[test]
    fn test_trigger_limit_accepts_whole_floats() {
        let mut block = email_block();
        block["triggerlimit"] = json!(15.0);
        let request = map_channel("email", &block, "email_channel.0").value.unwrap();
        assert_eq!(request.triggerlimit.get(), 15);
        assert_eq!(serde_json::to_value(request.triggerlimit).unwrap(), json!(15));

        assert!(TriggerLimit::try_from(100_001_i64).is_err());
        assert!(TriggerLimit::try_from(2.5).is_err());
        assert_eq!(TriggerLimit::try_from(100_000_i64).unwrap().get(), 100_000);
    }

    #[test]
    fn test_decode_errors_are_diagnostics() {
        let block = json!({"emails": "not an array", "triggerlimit": 1});
        let mapped = map_channel("email", &block, "email_channel.0");
        assert!(mapped.value.is_none());
        assert_eq!(mapped.diagnostics[0].summary, "invalid email_channel configuration");
        assert_eq!(mapped.diagnostics[0].attribute.as_deref(), Some("email_channel.0"));

        let mapped = map_channel("pagerduty", &json!({"triggerlimit": 1}), "pagerduty_channel.0");
        assert!(mapped.value.is_none());
        assert!(mapped.diagnostics[0].detail.as_deref().unwrap().contains("key"));

        let mapped = map_channel("slack", &json!("not a block"), "slack_channel.0");
        assert!(mapped.value.is_none());
        assert_eq!(mapped.diagnostics.len(), 1);
    }

    #[test]
    fn test_aggregation_is_integration_major() {
        // serde_json objects are keyed, so declaration order across blocks
        // cannot influence the result; only the fixed integration order can.
        let config = json!({
            "pagerduty_channel": [{"key": "k", "triggerlimit": 5}],
            "webhook_channel": [webhook_block()],
            "email_channel": [email_block()]
        });

        let mapped = aggregate_channels(&config);
        assert!(mapped.diagnostics.is_empty());
        let order: Vec<_> = mapped.value.iter().map(|c| c.integration).collect();
        assert_eq!(
            order,
            vec![IntegrationType::Email, IntegrationType::PagerDuty, IntegrationType::Webhook]
        );
    }

    #[test]
    fn test_aggregation_keeps_declaration_order_within_block() {
        let mut second = email_block();
        second["emails"] = json!(["second@logdna.com"]);
        let config = json!({"email_channel": [email_block(), second]});

        let mapped = aggregate_channels(&config);
        assert_eq!(mapped.value.len(), 2);
        assert_eq!(mapped.value[0].emails, vec!["test@logdna.com"]);
        assert_eq!(mapped.value[1].emails, vec!["second@logdna.com"]);
    }

    #[test]
    fn test_aggregation_continues_past_bad_channels() {
        let mut bad = webhook_block();
        bad["bodytemplate"] = json!("{\"test\": }");
        let config = json!({
            "email_channel": [{"emails": ["a@b.c"], "triggerlimit": 0}],
            "slack_channel": [{"url": "https://hooks.slack.com/x", "triggerlimit": 3}],
            "webhook_channel": [bad]
        });

        let mapped = aggregate_channels(&config);
        assert!(mapped.has_errors());
        assert_eq!(mapped.diagnostics.len(), 2);
        assert_eq!(mapped.diagnostics[0].attribute.as_deref(), Some("email_channel.0"));
        // slack survives, webhook survives with an empty template
        assert_eq!(mapped.value.len(), 2);
        assert_eq!(mapped.value[0].integration, IntegrationType::Slack);
        assert!(mapped.value[1].body_template.is_empty());
    }

    #[test]
    fn test_integration_type_from_str() {
        assert_eq!("pagerduty".parse::<IntegrationType>().unwrap(), IntegrationType::PagerDuty);
        assert!(matches!(
            "PagerDuty".parse::<IntegrationType>(),
            Err(MappingError::UnsupportedIntegration(tag)) if tag == "PagerDuty"
        ));
    }

    #[test]
    fn test_enum_names_match_serde() {
        for name in Operator::NAMES {
            let parsed: Operator = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(name));
        }
        for name in TriggerInterval::NAMES {
            let parsed: TriggerInterval = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(name));
        }
        for name in WebhookMethod::NAMES {
            let parsed: WebhookMethod = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(name));
        }
    }
}
