//! Declarative form schemas.
//!
//! A schema is plain JSON, so forms can be described in data files:
//!
//! ```json
//! {
//!   "fields": [
//!     {
//!       "name": ["settings", "index.number_of_shards"],
//!       "type": "number",
//!       "rowProps": { "label": "Primary shards", "required": true },
//!       "options": {
//!         "initialValue": 1,
//!         "rules": [{ "required": true, "min": 1, "message": "At least one shard" }]
//!       }
//!     }
//!   ],
//!   "advancedSettings": { "blockedNameList": ["settings"] }
//! }
//! ```
//!
//! Every malformed field is reported, not just the first one.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{
    AdvancedSettings, ComboBoxSingle, FieldControl, FieldSpec, FormGenerator, NumberInput,
    RowProps, Select, SelectOption, StaticText, Switch, TextInput,
};
use crate::path::{FieldName, PathSegment};
use crate::rules::{Format, PatternError, Rule, Trigger};
use crate::store::{FieldDescriptor, FieldStore};

/// Errors that can occur while reading a form schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    /// The schema text is not JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field entry is structurally wrong.
    #[error("Field #{index}: {reason}")]
    InvalidField { index: usize, reason: String },

    /// A field names a control type nobody provides.
    #[error("Field '{field}': unknown control type '{kind}'")]
    UnknownControl { field: String, kind: String },

    /// A rule pattern does not compile.
    #[error("Field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: PatternError,
    },

    /// Multiple errors occurred
    #[error("Multiple errors: {0:?}")]
    Multiple(Vec<SchemaLoadError>),
}

/// A parsed schema, ready to bind to a store.
#[derive(Debug)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
    pub advanced: Option<AdvancedSettings>,
}

impl FormSchema {
    /// Parses a schema using only the built-in controls.
    pub fn from_json(json: &Value) -> Result<Self, SchemaLoadError> {
        FormSchemaParser::new().parse(json)
    }

    /// Parses schema text with the built-in controls.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaLoadError> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Builds a generator over `store` from this schema.
    pub fn into_generator(self, store: FieldStore) -> FormGenerator {
        let generator = FormGenerator::new(store, self.fields);
        match self.advanced {
            Some(advanced) => generator.with_advanced_settings(advanced),
            None => generator,
        }
    }
}

/// Schema parser with caller-supplied controls.
///
/// Custom controls are looked up by `type` before the built-ins, so a
/// custom control may also replace a built-in one.
#[derive(Default)]
pub struct FormSchemaParser {
    controls: IndexMap<String, Arc<dyn FieldControl>>,
}

impl FormSchemaParser {
    /// A parser that knows only the built-in controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom control under `kind`.
    pub fn control(mut self, kind: impl Into<String>, control: impl FieldControl + 'static) -> Self {
        self.controls.insert(kind.into(), Arc::new(control));
        self
    }

    /// Parses a schema, collecting every field error.
    pub fn parse(&self, json: &Value) -> Result<FormSchema, SchemaLoadError> {
        let entries = json
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaLoadError::InvalidField {
                index: 0,
                reason: "Missing 'fields' array".to_string(),
            })?;

        let mut fields = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            match self.parse_field(index, entry) {
                Ok(spec) => fields.push(spec),
                Err(e) => errors.push(e),
            }
        }

        let advanced = match json.get("advancedSettings") {
            None | Some(Value::Null) => None,
            Some(settings) => match parse_advanced(settings) {
                Ok(advanced) => Some(advanced),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        if errors.is_empty() {
            Ok(FormSchema { fields, advanced })
        } else {
            Err(SchemaLoadError::Multiple(errors))
        }
    }

    fn parse_field(&self, index: usize, entry: &Value) -> Result<FieldSpec, SchemaLoadError> {
        let invalid = |reason: &str| SchemaLoadError::InvalidField {
            index,
            reason: reason.to_string(),
        };

        let name = entry
            .get("name")
            .and_then(parse_name)
            .ok_or_else(|| invalid("Missing or malformed 'name'"))?;
        let field = name.serialize();

        let kind = entry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'type' field"))?;

        let options = entry.get("options").cloned().unwrap_or(Value::Null);
        let props = match options.get("props") {
            Some(Value::Object(props)) => props.clone(),
            _ => Map::new(),
        };

        let control = self
            .resolve_control(kind, &props)
            .ok_or_else(|| SchemaLoadError::UnknownControl {
                field: field.clone(),
                kind: kind.to_string(),
            })?;

        let mut descriptor = FieldDescriptor::new(name).props(props);
        if let Some(initial) = options.get("initialValue") {
            descriptor = descriptor.initial_value(initial.clone());
        }
        if let Some(rules) = options.get("rules") {
            let rules = rules
                .as_array()
                .ok_or_else(|| invalid("'rules' must be an array"))?;
            for rule in rules {
                descriptor = descriptor.rule(parse_rule(index, &field, rule)?);
            }
        }

        let row = entry
            .get("rowProps")
            .map(parse_row)
            .unwrap_or_default();

        Ok(FieldSpec::with_control(descriptor, control).row(row))
    }

    fn resolve_control(
        &self,
        kind: &str,
        props: &Map<String, Value>,
    ) -> Option<Arc<dyn FieldControl>> {
        if let Some(custom) = self.controls.get(kind) {
            return Some(Arc::clone(custom));
        }
        let control: Arc<dyn FieldControl> = match kind {
            "text" => Arc::new(TextInput),
            "number" => Arc::new(NumberInput),
            "switch" => Arc::new(Switch),
            "select" => Arc::new(Select::new(parse_options(props))),
            "comboBoxSingle" => Arc::new(ComboBoxSingle::new(parse_options(props))),
            "staticText" => Arc::new(StaticText),
            _ => return None,
        };
        Some(control)
    }
}

impl std::fmt::Debug for FormSchemaParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSchemaParser")
            .field("controls", &self.controls.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_name(value: &Value) -> Option<FieldName> {
    match value {
        Value::String(key) => Some(FieldName::from(key)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(key) => Some(PathSegment::field(key.clone())),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .map(PathSegment::index),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .filter(|segments| !segments.is_empty())
            .map(FieldName::from),
        _ => None,
    }
}

fn parse_row(value: &Value) -> RowProps {
    let mut row = RowProps::new(value.get("label").and_then(Value::as_str).unwrap_or_default());
    if let Some(help) = value.get("helpText").and_then(Value::as_str) {
        row = row.help_text(help);
    }
    if value.get("required").and_then(Value::as_bool) == Some(true) {
        row = row.required();
    } else if value.get("optional").and_then(Value::as_bool) == Some(true) {
        row = row.optional();
    }
    row
}

fn parse_options(props: &Map<String, Value>) -> Vec<SelectOption> {
    let Some(Value::Array(items)) = props.get("options") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(SelectOption::plain(s.clone())),
            Value::Object(obj) => {
                let value = obj.get("value")?.clone();
                let label = obj
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| match &value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                Some(SelectOption::new(label, value))
            }
            _ => None,
        })
        .collect()
}

fn parse_rule(index: usize, field: &str, json: &Value) -> Result<Rule, SchemaLoadError> {
    let Value::Object(obj) = json else {
        return Err(SchemaLoadError::InvalidField {
            index,
            reason: "each rule must be an object".to_string(),
        });
    };

    let mut rule = Rule::new();
    if obj.get("required").and_then(Value::as_bool) == Some(true) {
        rule = rule.required();
    }
    if let Some(pattern) = obj.get("pattern").and_then(Value::as_str) {
        rule = rule
            .pattern(pattern)
            .map_err(|source| SchemaLoadError::InvalidPattern {
                field: field.to_string(),
                source,
            })?;
    }

    let as_usize = |key: &str| {
        obj.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    };
    if let Some(n) = as_usize("minLength") {
        rule = rule.min_length(n);
    }
    if let Some(n) = as_usize("maxLength") {
        rule = rule.max_length(n);
    }
    if let Some(n) = as_usize("length") {
        rule = rule.length(n);
    }
    if let Some(min) = obj.get("min").and_then(Value::as_f64) {
        rule = rule.min(min);
    }
    if let Some(max) = obj.get("max").and_then(Value::as_f64) {
        rule = rule.max(max);
    }
    if let Some(name) = obj.get("format").and_then(Value::as_str) {
        match Format::parse(name) {
            Some(format) => rule = rule.format(format),
            None => tracing::debug!(field, format = name, "ignoring unknown format"),
        }
    }
    if let Some(message) = obj.get("message").and_then(Value::as_str) {
        rule = rule.message(message);
    }
    if let Some(trigger) = obj.get("trigger").and_then(Value::as_str) {
        rule = rule.trigger(Trigger::parse(trigger).ok_or_else(|| {
            SchemaLoadError::InvalidField {
                index,
                reason: format!("unknown trigger '{trigger}'"),
            }
        })?);
    }
    Ok(rule)
}

fn parse_advanced(json: &Value) -> Result<AdvancedSettings, SchemaLoadError> {
    let invalid = || SchemaLoadError::InvalidField {
        index: 0,
        reason: "'advancedSettings.blockedNameList' must list field names".to_string(),
    };
    let names = match json.get("blockedNameList") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_name)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?,
        Some(_) => return Err(invalid()),
    };
    Ok(AdvancedSettings::new().block_all(names))
}
