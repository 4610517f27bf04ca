//! Message templates
//!
//! `${data}` expands to the whole check data, `${data.key}` (or a dotted
//! path) to one field. Lists are joined with ", "; missing fields expand to
//! nothing.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*data(?:\.([A-Za-z0-9_$.-]+))?\s*\}").unwrap());

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Expand the data placeholders of a message template
pub fn render_message(template: &str, data: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
            Some(path) => lookup(data, path.as_str()).map(display).unwrap_or_default(),
            None => display(data),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        assert_eq!(render_message("Element has an alt attribute", &Value::Null), "Element has an alt attribute");
    }

    #[test]
    fn test_whole_data() {
        let data = json!(["aria-checked", "aria-controls"]);
        assert_eq!(
            render_message("Required ARIA attributes not present: ${data}", &data),
            "Required ARIA attributes not present: aria-checked, aria-controls"
        );
        assert_eq!(render_message("Role: ${data}", &json!("banner")), "Role: banner");
    }

    #[test]
    fn test_data_fields() {
        let data = json!({ "contrastRatio": 2.5, "fgColor": "#777777", "nested": { "size": "12pt" } });
        assert_eq!(
            render_message("contrast of ${data.contrastRatio} (foreground ${data.fgColor}, ${data.nested.size})", &data),
            "contrast of 2.5 (foreground #777777, 12pt)"
        );
    }

    #[test]
    fn test_missing_field_expands_to_nothing() {
        assert_eq!(render_message("[${data.missing}]", &json!({})), "[]");
        assert_eq!(render_message("[${data}]", &Value::Null), "[]");
    }
}
