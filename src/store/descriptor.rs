//! Field descriptors and the bindings handed to controls.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{FieldStatus, FieldStore};
use crate::path::FieldName;
use crate::rules::Rule;

/// Converts a value on its way between the tree and a control.
pub type ValueTransform = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// How a field is registered with a store.
///
/// Registering the same name again replaces the stored descriptor, so rules
/// and props may change from one render to the next.
///
/// # Example
///
/// ```rust
/// use formfield::{FieldDescriptor, FieldStore, Rule};
/// use serde_json::json;
///
/// let store = FieldStore::new(json!({}));
/// let binding = store.register_field(
///     FieldDescriptor::new(["settings", "index.number_of_replicas"])
///         .initial_value(json!(1))
///         .rule(Rule::new().required().min(0.0)),
/// );
/// assert_eq!(binding.value(), &json!(1));
/// ```
#[derive(Clone, Default)]
pub struct FieldDescriptor {
    pub name: FieldName,
    /// Written into the tree on first registration if the location is absent.
    pub initial_value: Option<Value>,
    pub rules: Vec<Rule>,
    /// Passed through untouched to the control.
    pub props: Map<String, Value>,
    /// Tree value -> control value.
    pub to_control: Option<ValueTransform>,
    /// Control value -> tree value.
    pub from_control: Option<ValueTransform>,
}

impl FieldDescriptor {
    /// A descriptor with no rules or transforms.
    pub fn new(name: impl Into<FieldName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the value written on first registration.
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Appends one rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends several rules in order.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets one control prop.
    pub fn prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Merges control props.
    pub fn props(mut self, props: Map<String, Value>) -> Self {
        self.props.extend(props);
        self
    }

    /// Converts tree values before they reach the control.
    pub fn to_control<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.to_control = Some(Arc::new(transform));
        self
    }

    /// Converts control input before it is written.
    pub fn from_control<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.from_control = Some(Arc::new(transform));
        self
    }

    /// True if any rule makes the field mandatory.
    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|rule| rule.required)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("initial_value", &self.initial_value)
            .field("rules", &self.rules)
            .field("props", &self.props)
            .field("to_control", &self.to_control.is_some())
            .field("from_control", &self.from_control.is_some())
            .finish()
    }
}

/// What a control needs to render one field and report changes back.
///
/// A binding is a snapshot taken at registration time; register again on the
/// next render to pick up newer values and errors.
#[derive(Clone)]
pub struct FieldBinding {
    pub(crate) name: FieldName,
    pub(crate) value: Value,
    pub(crate) errors: Option<Vec<String>>,
    pub(crate) status: FieldStatus,
    pub(crate) props: Map<String, Value>,
    pub(crate) from_control: Option<ValueTransform>,
    pub(crate) store: FieldStore,
}

impl FieldBinding {
    /// The bound field.
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    /// The current value, already converted for the control.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Cached messages at registration time.
    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    /// True when the field had messages.
    pub fn is_invalid(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// The validation status at registration time.
    pub fn status(&self) -> FieldStatus {
        self.status
    }

    /// Props passed through to the control.
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Writes a control value into the store, re-running change rules when
    /// live validation is on.
    pub fn on_change(&self, input: Value) {
        let value = match &self.from_control {
            Some(transform) => transform(&input),
            None => input,
        };
        self.store.handle_change(&self.name, value);
    }

    /// Re-runs the field's blur rules.
    pub fn on_blur(&self) {
        self.store.handle_blur(&self.name);
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("errors", &self.errors)
            .field("status", &self.status)
            .field("props", &self.props)
            .finish()
    }
}
