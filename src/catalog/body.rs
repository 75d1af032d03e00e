use serde_json::Value;

/// Bring a raw body into its canonical string form.
///
/// - `null`, `{}`, `[]` and `""` become the empty string
/// - form-encoded bodies are opaque strings and are taken verbatim
/// - everything else is compacted JSON, keeping key order
pub fn normalize_body(raw: &Value, form_encoded: bool) -> serde_json::Result<String> {
    if is_empty_body(raw) {
        return Ok(String::new());
    }

    if form_encoded {
        return Ok(match raw {
            Value::String(s) => trim_quotes(s).to_string(),
            other => trim_quotes(&other.to_string()).to_string(),
        });
    }

    serde_json::to_string(raw)
}

fn is_empty_body(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Strip the quoting and line-ending artifacts around a scalar value.
pub fn trim_quotes(value: &str) -> &str {
    let value = value.trim_end_matches(['\r', '\n']);
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
