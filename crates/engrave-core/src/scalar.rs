//! Lenient scalar handling for hand-written YAML.
//!
//! Contributors write `age: 27` as often as `age: "27"`; both land as text.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Deserialize an optional scalar of any YAML type into text.
///
/// Blank strings, `null` and collections all become `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(yaml_to_text))
}

/// Render a YAML value as display text, or `None` for nulls and collections.
pub fn yaml_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => yaml_to_text(&tagged.value),
        _ => None,
    }
}

/// Whether a value is a sequence or mapping, looking through tags.
pub fn is_collection(value: &Value) -> bool {
    match value {
        Value::Sequence(_) | Value::Mapping(_) => true,
        Value::Tagged(tagged) => is_collection(&tagged.value),
        _ => false,
    }
}
