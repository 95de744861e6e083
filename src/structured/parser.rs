//! Structured result parsing and enum coercion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::extract::extract_json_candidate;
use super::schema::{FieldKind, ItemSchema};
use crate::{Error, Result};

/// One parsed result object: declared fields coerced, any extra fields kept as metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredItem(Map<String, Value>);

impl StructuredItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of `field`, or `""` when absent or not a string.
    pub fn str(&self, field: &str) -> &str {
        self.0.get(field).and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn parse_json(raw: &str, schema: &ItemSchema) -> Result<Value> {
    // Whole-text JSON first: a fence quoted inside a string value is content, not a wrapper.
    if let Ok(value) = serde_json::from_str(raw.trim()) {
        return Ok(value);
    }
    let candidate = extract_json_candidate(raw);
    serde_json::from_str(candidate).map_err(|e| {
        Error::malformed(format!("{} response is not valid JSON: {}", schema.name, e))
    })
}

/// Parse an array of items, accepting either a bare array or an object wrapping the array
/// under the schema's collection key. Non-object entries are skipped. The advisory cap is
/// not enforced.
pub fn parse_items(raw: &str, schema: &ItemSchema) -> Result<Vec<StructuredItem>> {
    let value = parse_json(raw, schema)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match schema.collection_key.and_then(|k| obj.remove(k)) {
            Some(Value::Array(entries)) => entries,
            Some(_) => Vec::new(),
            None => {
                // Some models return a lone object instead of a one-element array.
                if schema.fields.iter().any(|f| obj.contains_key(f.name)) {
                    vec![Value::Object(obj)]
                } else {
                    Vec::new()
                }
            }
        },
        _ => Vec::new(),
    };

    let items: Vec<StructuredItem> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(obj) => Some(coerce(obj, schema)),
            other => {
                debug!(schema = schema.name, entry = %other, "skipping non-object entry");
                None
            }
        })
        .collect();

    if let Some(cap) = schema.advisory_cap {
        if items.len() > cap {
            debug!(
                schema = schema.name,
                count = items.len(),
                advisory_cap = cap,
                "model returned more items than requested"
            );
        }
    }
    Ok(items)
}

/// Parse a single object result (e.g. a scene plan).
pub fn parse_object(raw: &str, schema: &ItemSchema) -> Result<StructuredItem> {
    let value = parse_json(raw, schema)?;
    let kind = json_type(&value);
    let object = match value {
        Value::Object(obj) => Some(obj),
        Value::Array(entries) => match entries.into_iter().next() {
            Some(Value::Object(obj)) => Some(obj),
            _ => None,
        },
        _ => None,
    };
    object.map(|obj| coerce(obj, schema)).ok_or_else(|| {
        Error::malformed(format!(
            "{} response must be a JSON object, got {}",
            schema.name, kind
        ))
    })
}

fn coerce(mut obj: Map<String, Value>, schema: &ItemSchema) -> StructuredItem {
    for spec in schema.fields {
        let current = obj.remove(spec.name);
        let coerced = match spec.kind {
            FieldKind::Text => match current {
                Some(Value::String(s)) => Value::String(s),
                Some(Value::Null) | None => Value::String(String::new()),
                Some(other) => Value::String(other.to_string()),
            },
            FieldKind::Enum { allowed, default } => {
                let matched = current
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim())
                    .and_then(|s| allowed.iter().find(|a| a.eq_ignore_ascii_case(s)));
                match matched {
                    Some(canonical) => Value::String((*canonical).to_string()),
                    None => {
                        debug!(
                            schema = schema.name,
                            field = spec.name,
                            value = ?current,
                            default,
                            "unknown enum value replaced with default"
                        );
                        Value::String(default.to_string())
                    }
                }
            }
        };
        obj.insert(spec.name.to_string(), coerced);
    }
    StructuredItem(obj)
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
