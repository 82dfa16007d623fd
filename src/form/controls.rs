//! Built-in controls and the capability trait custom controls implement.
//!
//! A control only converts values between the tree and its own display form
//! and describes itself for rendering. It never touches the store; the
//! generator owns that wiring.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::store::FieldBinding;

/// One entry of a select or combo box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    /// An option with a distinct label.
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// An option whose label is its own value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value: Value::String(value),
        }
    }
}

/// The render model of one bound control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlView {
    pub kind: String,
    pub value: Value,
    pub props: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    pub read_only: bool,
}

/// What every control, built-in or custom, provides to the generator.
pub trait FieldControl: Send + Sync {
    /// Identifies the control in render output and declarative schemas.
    fn kind(&self) -> &str;

    /// Tree value -> what the control shows.
    fn to_display(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Raw control input -> tree value.
    fn from_input(&self, raw: Value) -> Value {
        raw
    }

    fn render(&self, binding: &FieldBinding) -> ControlView {
        ControlView {
            kind: self.kind().to_string(),
            value: self.to_display(binding.value()),
            props: binding.props().clone(),
            options: None,
            read_only: false,
        }
    }
}

/// Single-line text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInput;

impl FieldControl for TextInput {
    fn kind(&self) -> &str {
        "text"
    }

    fn to_display(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::String(String::new()),
            other => other.clone(),
        }
    }
}

/// Numeric input.
///
/// Blank text becomes `null` and numeric text becomes a number. Anything
/// else is kept as typed so the field's rules can reject it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberInput;

impl FieldControl for NumberInput {
    fn kind(&self) -> &str {
        "number"
    }

    fn to_display(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::String(String::new()),
            other => other.clone(),
        }
    }

    fn from_input(&self, raw: Value) -> Value {
        let Value::String(text) = &raw else {
            return raw;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Number(int.into());
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(raw)
    }
}

/// Boolean toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Switch;

impl FieldControl for Switch {
    fn kind(&self) -> &str {
        "switch"
    }

    fn to_display(&self, value: &Value) -> Value {
        Value::Bool(truthy(value))
    }

    fn from_input(&self, raw: Value) -> Value {
        Value::Bool(truthy(&raw))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Pick one of a fixed list.
#[derive(Debug, Clone, Default)]
pub struct Select {
    pub options: Vec<SelectOption>,
}

impl Select {
    /// A select over `options`.
    pub fn new(options: impl IntoIterator<Item = SelectOption>) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }
}

impl FieldControl for Select {
    fn kind(&self) -> &str {
        "select"
    }

    fn render(&self, binding: &FieldBinding) -> ControlView {
        ControlView {
            kind: self.kind().to_string(),
            value: self.to_display(binding.value()),
            props: binding.props().clone(),
            options: Some(self.options.clone()),
            read_only: false,
        }
    }
}

/// Searchable single-value combo box.
///
/// The widget works with a selection list; the tree holds the bare value.
#[derive(Debug, Clone, Default)]
pub struct ComboBoxSingle {
    pub options: Vec<SelectOption>,
}

impl ComboBoxSingle {
    /// A single-choice combo box over `options`.
    pub fn new(options: impl IntoIterator<Item = SelectOption>) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }

    fn label_for(&self, value: &Value) -> String {
        self.options
            .iter()
            .find(|option| &option.value == value)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

impl FieldControl for ComboBoxSingle {
    fn kind(&self) -> &str {
        "comboBoxSingle"
    }

    fn to_display(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Array(Vec::new());
        }
        let mut selected = Map::new();
        selected.insert("label".into(), Value::String(self.label_for(value)));
        selected.insert("value".into(), value.clone());
        Value::Array(vec![Value::Object(selected)])
    }

    fn from_input(&self, raw: Value) -> Value {
        match raw {
            Value::Array(mut items) => {
                if items.is_empty() {
                    return Value::Null;
                }
                match items.swap_remove(0) {
                    Value::Object(mut selected) if selected.contains_key("value") => {
                        selected.remove("value").unwrap_or(Value::Null)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    fn render(&self, binding: &FieldBinding) -> ControlView {
        ControlView {
            kind: self.kind().to_string(),
            value: self.to_display(binding.value()),
            props: binding.props().clone(),
            options: Some(self.options.clone()),
            read_only: false,
        }
    }
}

/// Read-only display of the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticText;

impl FieldControl for StaticText {
    fn kind(&self) -> &str {
        "staticText"
    }

    fn to_display(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::String("-".into()),
            Value::String(_) => value.clone(),
            other => Value::String(other.to_string()),
        }
    }

    fn render(&self, binding: &FieldBinding) -> ControlView {
        ControlView {
            kind: self.kind().to_string(),
            value: self.to_display(binding.value()),
            props: binding.props().clone(),
            options: None,
            read_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_input_conversion() {
        assert_eq!(NumberInput.from_input(json!("")), Value::Null);
        assert_eq!(NumberInput.from_input(json!(" 12 ")), json!(12));
        assert_eq!(NumberInput.from_input(json!("1.5")), json!(1.5));
        assert_eq!(NumberInput.from_input(json!("12abc")), json!("12abc"));
        assert_eq!(NumberInput.from_input(json!(7)), json!(7));
        assert_eq!(NumberInput.to_display(&Value::Null), json!(""));
    }

    #[test]
    fn test_switch_truthiness() {
        assert_eq!(Switch.from_input(json!(null)), json!(false));
        assert_eq!(Switch.from_input(json!(0)), json!(false));
        assert_eq!(Switch.from_input(json!("")), json!(false));
        assert_eq!(Switch.from_input(json!("no")), json!(true));
        assert_eq!(Switch.from_input(json!([])), json!(true));
    }

    #[test]
    fn test_combo_box_selection() {
        let combo = ComboBoxSingle::new([SelectOption::new("Hot", json!("hot"))]);
        assert_eq!(combo.from_input(json!([])), Value::Null);
        assert_eq!(
            combo.from_input(json!([{"label": "Hot", "value": "hot"}])),
            json!("hot")
        );
        assert_eq!(combo.from_input(json!(["warm"])), json!("warm"));
        assert_eq!(
            combo.to_display(&json!("hot")),
            json!([{"label": "Hot", "value": "hot"}])
        );
        assert_eq!(
            combo.to_display(&json!("cold")),
            json!([{"label": "cold", "value": "cold"}])
        );
        assert_eq!(combo.to_display(&Value::Null), json!([]));
    }

    #[test]
    fn test_static_text_display() {
        assert_eq!(StaticText.to_display(&Value::Null), json!("-"));
        assert_eq!(StaticText.to_display(&json!(3)), json!("3"));
    }
}
