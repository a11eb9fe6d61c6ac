//! Best-effort argument coercion
//!
//! Planner output routinely stringifies numbers (`"16"`, `"0x1000"`) and
//! booleans (`"yes"`). Coercion converts such values to the declared
//! [`ParamType`] and returns `None` when no sensible conversion exists.

use serde_json::{Number, Value};

use super::entities::ParamType;

/// Parse integer text: decimal, `0x`-prefixed hex, or bare hex mixing digits
/// and hex letters (`7FF6A000`). Words spelled only in hex letters (`add`,
/// `face`) are not numbers. Accepts a leading sign and `_` separators.
pub fn parse_integer(text: &str) -> Option<Number> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if digits.is_empty() {
        return None;
    }

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()?
    } else if digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse::<u64>().ok()?
    } else if digits.chars().all(|c| c.is_ascii_hexdigit())
        && digits.chars().any(|c| c.is_ascii_digit())
    {
        u64::from_str_radix(digits, 16).ok()?
    } else {
        return None;
    };

    if negative {
        let signed = i64::try_from(magnitude).ok()?;
        Some(Number::from(-signed))
    } else {
        Some(Number::from(magnitude))
    }
}

/// Parse a boolean literal (case-insensitive).
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce `value` to `expected`. Returns `None` if the value cannot represent
/// the type.
pub fn coerce(value: &Value, expected: ParamType) -> Option<Value> {
    match expected {
        ParamType::Integer => coerce_integer(value),
        ParamType::Boolean => coerce_bool(value),
        ParamType::String => coerce_string(value),
        ParamType::List => coerce_list(value),
        ParamType::Mapping => coerce_mapping(value),
    }
}

fn coerce_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) => {
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                Some(Value::from(f as i64))
            } else {
                None
            }
        }
        Value::String(s) => parse_integer(s).map(Value::Number),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        Value::String(s) => parse_bool(s).map(Value::Bool),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(value.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                return match serde_json::from_str::<Value>(trimmed) {
                    Ok(v @ Value::Array(_)) => Some(v),
                    _ => None,
                };
            }
            let parts: Vec<&str> = trimmed
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            let integers: Option<Vec<Value>> = parts
                .iter()
                .map(|p| parse_integer(p).map(Value::Number))
                .collect();
            match integers {
                Some(values) => Some(Value::Array(values)),
                None => Some(Value::Array(
                    parts.into_iter().map(|p| Value::String(p.to_string())).collect(),
                )),
            }
        }
        Value::Number(_) => Some(Value::Array(vec![value.clone()])),
        _ => None,
    }
}

fn coerce_mapping(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(v @ Value::Object(_)) => Some(v),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce loosely-typed text (heuristic extraction output) into the most
/// specific JSON scalar it looks like.
pub fn infer_scalar(text: &str) -> Value {
    let trimmed = text.trim().trim_matches(|c| c == '"' || c == '\'');
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "none" => return Value::Null,
        _ => {}
    }
    if trimmed.chars().all(|c| c.is_ascii_digit() || c == '-')
        && let Some(n) = parse_integer(trimmed)
    {
        return Value::Number(n);
    }
    if let Ok(f) = trimmed.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(trimmed.to_string())
}
