//! Provider and resource schemas.
//!
//! Every constraint the API would otherwise reject at request time is
//! declared here, so [`crate::validation::validate`] can report it before
//! anything is sent.

use serde_json::{json, Value};

use crate::channel::{IntegrationType, Operator, TriggerInterval, TriggerLimit, WebhookMethod};
use crate::request::CategoryType;
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, Constraint, Diagnostic, NestedBlock,
    ProviderSchema, Schema,
};
use crate::types::ResourceKind;

/// The `provider` block.
pub fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "servicekey",
            Attribute::required_string()
                .sensitive()
                .with_constraint(Constraint::NonEmpty)
                .with_description("LogDNA service key"),
        )
        .with_attribute(
            "url",
            Attribute::optional_string()
                .with_default(json!(crate::config::DEFAULT_API_URL))
                .with_constraint(Constraint::Uri)
                .with_description("LogDNA API host"),
        )
}

fn trigger_attributes(block: Block) -> Block {
    block
        .with_attribute(
            "immediate",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "operator",
            Attribute::optional_string()
                .with_default(json!("presence"))
                .with_constraint(Constraint::one_of(Operator::NAMES)),
        )
        .with_attribute(
            "terminal",
            Attribute::optional_bool().with_default(json!(true)),
        )
        .with_attribute(
            "triggerinterval",
            Attribute::optional_string()
                .with_default(json!("15m"))
                .with_constraint(Constraint::one_of(TriggerInterval::NAMES)),
        )
        .with_attribute(
            "triggerlimit",
            Attribute::required_int64()
                .with_constraint(Constraint::int_range(TriggerLimit::MIN, TriggerLimit::MAX)),
        )
}

/// The nested block declaring channels of one integration.
pub fn channel_block(integration: IntegrationType) -> NestedBlock {
    let block = trigger_attributes(Block::new());
    let block = match integration {
        IntegrationType::Email => block
            .with_attribute(
                "emails",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::required(),
                )
                .with_constraint(Constraint::NonEmpty),
            )
            .with_attribute("timezone", Attribute::optional_string()),
        IntegrationType::PagerDuty => block.with_attribute(
            "key",
            Attribute::required_string().with_constraint(Constraint::NonEmpty),
        ),
        IntegrationType::Slack => block.with_attribute(
            "url",
            Attribute::required_string().with_constraint(Constraint::Uri),
        ),
        IntegrationType::Webhook => block
            .with_attribute(
                "url",
                Attribute::required_string().with_constraint(Constraint::Uri),
            )
            .with_attribute(
                "method",
                Attribute::optional_string()
                    .with_default(json!("post"))
                    .with_constraint(Constraint::one_of(WebhookMethod::NAMES)),
            )
            .with_attribute(
                "headers",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    AttributeFlags::optional(),
                ),
            )
            .with_attribute(
                "bodytemplate",
                Attribute::optional_string()
                    .with_constraint(Constraint::Json)
                    .with_description("JSON payload template, sent as written"),
            ),
    };
    NestedBlock::list(block.with_description(format!("{} notification channel", integration)))
}

fn with_channel_blocks(schema: Schema) -> Schema {
    IntegrationType::ALL
        .into_iter()
        .fold(schema, |schema, integration| {
            schema.with_block(integration.block_name(), channel_block(integration))
        })
}

/// The `logdna_view` resource.
pub fn view_schema() -> Schema {
    let schema = Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute("query", Attribute::optional_string())
        .with_attribute("apps", Attribute::optional_string_list())
        .with_attribute("categories", Attribute::optional_string_list())
        .with_attribute("hosts", Attribute::optional_string_list())
        .with_attribute("levels", Attribute::optional_string_list())
        .with_attribute("tags", Attribute::optional_string_list());
    with_channel_blocks(schema)
}

/// The `logdna_alert` resource.
pub fn alert_schema() -> Schema {
    let schema = Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string());
    with_channel_blocks(schema)
}

/// The `logdna_category` resource.
pub fn category_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute(
            "type",
            Attribute::required_string().with_constraint(Constraint::one_of(CategoryType::NAMES)),
        )
}

/// The schema of `kind`.
pub fn resource_schema(kind: ResourceKind) -> Schema {
    match kind {
        ResourceKind::View => view_schema(),
        ResourceKind::Alert => alert_schema(),
        ResourceKind::Category => category_schema(),
    }
}

/// The full provider schema.
pub fn provider_schema() -> ProviderSchema {
    ResourceKind::ALL.into_iter().fold(
        ProviderSchema::new().with_provider_config(provider_config_schema()),
        |schema, kind| schema.with_resource(kind.type_name(), resource_schema(kind)),
    )
}

/// Rules spanning several attributes, which a per-attribute schema cannot
/// express.
pub fn check_resource_rules(kind: ResourceKind, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if kind == ResourceKind::Alert {
        let channels: usize = IntegrationType::ALL
            .iter()
            .filter_map(|i| config.get(i.block_name()).and_then(Value::as_array))
            .map(Vec::len)
            .sum();
        if channels == 0 {
            diagnostics.push(
                Diagnostic::error("An alert requires at least one channel").with_detail(
                    "Declare at least one email_channel, pagerduty_channel, slack_channel or webhook_channel block.",
                ),
            );
        }
    }
    diagnostics
}
