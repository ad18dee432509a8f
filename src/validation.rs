//! Schema validation.
//!
//! Validates a resource's configuration (`serde_json::Value`) against its
//! [`Schema`] before any request body is built. Each offending attribute yields
//! its own diagnostic, so several violations can be reported together.
//!
//! # Example
//!
//! ```
//! use terraform_provider_logdna::schema::{Attribute, Constraint, Schema};
//! use terraform_provider_logdna::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "triggerlimit",
//!         Attribute::required_int64().with_constraint(Constraint::int_range(1, 100_000)),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "test", "triggerlimit": 15})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "test", "triggerlimit": 0}));
//! assert_eq!(diagnostics.len(), 1);
//! assert!(diagnostics[0].summary.contains("must be between 1 and 100,000 inclusive"));
//! ```

use crate::schema::{Attribute, AttributeType, Block, Constraint, Diagnostic, NestedBlock, Schema};
use serde_json::{Map, Value};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Constraints run on present values of the right type
/// - Nested blocks are validated per item with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let empty = Map::new();
    let obj = match value {
        Value::Object(map) => map,
        // a null nested block is absent; a null root is an empty configuration
        Value::Null if !path.is_empty() => return,
        Value::Null => &empty,
        _ => {
            let diagnostic = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)));
            diagnostics.push(if path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(path)
            });
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_list_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Computed-only attributes are set by the provider.
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail(format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            leaf_name(path)
                        ))
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            if validate_attribute_type(&attr.attr_type, v, path, diagnostics) {
                for constraint in &attr.constraints {
                    if let Some(diagnostic) = check_constraint(constraint, v, path) {
                        diagnostics.push(diagnostic);
                    }
                }
            }
        },
    }
}

/// Returns whether the value matched the expected type.
fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let before = diagnostics.len();
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
    diagnostics.len() == before
}

fn check_constraint(constraint: &Constraint, value: &Value, path: &str) -> Option<Diagnostic> {
    match constraint {
        Constraint::OneOf { values } => {
            let s = value.as_str()?;
            if values.iter().any(|allowed| allowed == s) {
                None
            } else {
                Some(
                    Diagnostic::error(format!(
                        "\"{}\" must be one of [{}]",
                        path,
                        values.join(", ")
                    ))
                    .with_detail(format!("Got \"{}\"", s))
                    .with_attribute(path),
                )
            }
        },
        Constraint::IntRange { min, max } => {
            let n = as_i64(value)?;
            if (*min..=*max).contains(&n) {
                None
            } else {
                Some(
                    Diagnostic::error(format!(
                        "\"{}\" must be between {} and {} inclusive",
                        path,
                        group_thousands(*min),
                        group_thousands(*max)
                    ))
                    .with_detail(format!("Got {}", n))
                    .with_attribute(path),
                )
            }
        },
        Constraint::NonEmpty => {
            let empty = match value {
                Value::String(s) => s.is_empty(),
                Value::Array(arr) => arr.is_empty(),
                _ => false,
            };
            empty.then(|| {
                Diagnostic::error(format!("\"{}\" must not be empty", path)).with_attribute(path)
            })
        },
        Constraint::Uri => {
            let s = value.as_str()?;
            match url::Url::parse(s) {
                Ok(_) => None,
                Err(err) => Some(
                    Diagnostic::error(format!("\"{}\" must be a valid uri", path))
                        .with_detail(err.to_string())
                        .with_attribute(path),
                ),
            }
        },
        Constraint::Json => {
            let s = value.as_str()?;
            if s.is_empty() {
                return None;
            }
            match serde_json::from_str::<&serde_json::value::RawValue>(s) {
                Ok(_) => None,
                Err(err) => Some(
                    Diagnostic::error(format!("\"{}\" is not a valid JSON string", path))
                        .with_detail(err.to_string())
                        .with_attribute(path),
                ),
            }
        },
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn is_int64(value: &Value) -> bool {
    as_i64(value).is_some()
}

/// Renders `100000` as `100,000`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
