//! Built-in rule evaluators.
//!
//! Each evaluator inspects one family of checks on a [`Rule`] and returns the
//! failure, if any. Values are `Option<&Value>` so that a location missing
//! from the tree ("undefined") is distinguishable from an explicit `null`.

use serde_json::Value;

use super::Rule;
use crate::error::FieldError;
use crate::path::FieldName;

/// Returns true for undefined, null, `""`, `[]` and `{}`.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Fails when the rule is required and the value is empty.
///
/// `0` and `false` are values, not absences, and pass.
pub fn required(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    if rule.required && is_empty_value(value) {
        Some(failure(name, rule, "required", format!("{} is required", label(name))))
    } else {
        None
    }
}

/// Fails when the value does not match the rule's fixed format.
pub fn format(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    let format = rule.format?;
    let text = as_text(value?)?;
    if format.matches(&text) {
        None
    } else {
        Some(failure(
            name,
            rule,
            "format",
            format!("{} is not a valid {}", label(name), format.as_str()),
        ))
    }
}

/// Checks `min`/`max` against numbers and numeric strings.
///
/// Strings are coerced to a number before comparing, so `"9"` fails `max: 5`
/// while `"abcdefghij"` is not a number and passes. This mirrors how the
/// bounds have always been applied to text inputs; string length is checked
/// by [`length`] instead.
pub fn size(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    if rule.min.is_none() && rule.max.is_none() {
        return None;
    }
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => coerce_number(s),
        _ => return None,
    };

    if let Some(min) = rule.min {
        if number < min {
            return Some(failure(
                name,
                rule,
                "min",
                format!(
                    "{} must be greater than or equal to {}",
                    label(name),
                    format_number(min)
                ),
            ));
        }
    }
    if let Some(max) = rule.max {
        if number > max {
            return Some(failure(
                name,
                rule,
                "max",
                format!(
                    "{} must be less than or equal to {}",
                    label(name),
                    format_number(max)
                ),
            ));
        }
    }
    None
}

/// Checks `length`, `min_length` and `max_length` against string characters
/// or array items.
pub fn length(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    if rule.length.is_none() && rule.min_length.is_none() && rule.max_length.is_none() {
        return None;
    }
    let (len, unit) = match value? {
        Value::String(s) => (s.chars().count(), "characters"),
        Value::Array(items) => (items.len(), "items"),
        _ => return None,
    };

    if let Some(exact) = rule.length {
        if len != exact {
            return Some(failure(
                name,
                rule,
                "length",
                format!("{} must be exactly {} {}", label(name), exact, unit),
            ));
        }
    }
    if let Some(min) = rule.min_length {
        if len < min {
            return Some(failure(
                name,
                rule,
                "min_length",
                format!("{} must be at least {} {}", label(name), min, unit),
            ));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Some(failure(
                name,
                rule,
                "max_length",
                format!("{} must be at most {} {}", label(name), max, unit),
            ));
        }
    }
    None
}

/// Fails when the value's text does not match the rule's pattern.
pub fn pattern(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    let pattern = rule.pattern.as_ref()?;
    let text = as_text(value?)?;
    if pattern.is_match(&text) {
        None
    } else {
        Some(failure(
            name,
            rule,
            "pattern",
            format!("{} does not match pattern {}", label(name), pattern.as_str()),
        ))
    }
}

/// Runs every built-in check of `rule` in order and returns the first failure.
///
/// When the value is empty and the rule is not required, only `required`
/// is consulted: an optional field left blank is valid.
pub fn check(name: &FieldName, rule: &Rule, value: Option<&Value>) -> Option<FieldError> {
    if let Some(error) = required(name, rule, value) {
        return Some(error);
    }
    if is_empty_value(value) {
        return None;
    }
    format(name, rule, value)
        .or_else(|| size(name, rule, value))
        .or_else(|| length(name, rule, value))
        .or_else(|| pattern(name, rule, value))
}

/// Returns the name used in default messages.
pub(crate) fn label(name: &FieldName) -> String {
    if name.is_root() {
        "value".to_string()
    } else {
        name.to_string()
    }
}

fn failure(name: &FieldName, rule: &Rule, code: &str, default: String) -> FieldError {
    let message = rule.message.clone().unwrap_or(default);
    FieldError::new(name.clone(), message).with_code(code)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerces text the way a numeric text input does: blank is zero, anything
/// unparseable is NaN (which never violates a bound).
fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
