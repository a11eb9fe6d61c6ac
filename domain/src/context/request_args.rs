//! Argument values mentioned in the request text itself.
//!
//! A request like "read 16 bytes at 0x1000" already names the `size` and
//! `address` a tool needs. Matches are returned as text; the registry's
//! coercion turns them into the declared parameter type.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Parameter name and pattern, tried in order; group 1 is the value.
const RULES: &[(&str, &str)] = &[
    ("address", r"(?i)\b(0x[0-9a-f]+)\b"),
    ("base", r"(?i)\bbase(?:\s+address)?\s*[:=]?\s*(0x[0-9a-f]+)\b"),
    ("value", r"(?i)\b(?:value|scan|search|find|for)\s*[:=]?\s*(-?\d+(?:\.\d+)?)\b"),
    ("size", r"(?i)\b(?:size|length)\s*[:=]?\s*(\d+)\b"),
    ("size", r"(?i)\b(\d+)\s*bytes?\b"),
    ("symbol", r"(?i)\b([\w.]+![A-Za-z_]\w*)"),
    ("symbol", r"(?i)\b([\w]+\.(?:exe|dll)\+(?:0x)?[0-9a-f]+)\b"),
    ("symbol", r"(?i)\b(?:symbol|function)\s*[:=]?\s*([A-Za-z_][\w.]*)"),
    ("pattern", r"(?i)\b(?:pattern|aob|signature)\s*[:=]?\s*((?:[0-9a-f?]{2}\s+)+[0-9a-f?]{2})"),
    ("string", r#"(?i)\b(?:string|text)\s*[:=]?\s*["']([^"']+)["']"#),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|(parameter, pattern)| Regex::new(pattern).ok().map(|re| (*parameter, re)))
        .collect()
});

/// The first value for `parameter` found in `request`, if any rule matches.
pub fn extract_from_request(request: &str, parameter: &str) -> Option<Value> {
    COMPILED
        .iter()
        .filter(|(name, _)| *name == parameter)
        .find_map(|(_, re)| re.captures(request)?.get(1))
        .map(|m| Value::String(m.as_str().trim().to_string()))
}
