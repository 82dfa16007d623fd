//! Binding declarative field lists to a store.
//!
//! A [`FormGenerator`] takes an ordered list of [`FieldSpec`]s, registers
//! each with a shared [`FieldStore`] on every render and produces a
//! serializable [`RenderedForm`] for whatever UI layer draws it. Control
//! events come back through [`FormGenerator::handle_input`] and
//! [`FormGenerator::handle_blur`].
//!
//! # Example
//!
//! ```rust
//! use formfield::form::{FieldSpec, FormGenerator, NumberInput, RowProps};
//! use formfield::{FieldDescriptor, FieldStore, FieldStoreOptions, Rule};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let store = FieldStore::with_options(FieldStoreOptions::new().auto_validate(false));
//! let form = FormGenerator::new(
//!     store.clone(),
//!     vec![FieldSpec::new(
//!         FieldDescriptor::new("replicas").rule(Rule::new().required().min(0.0)),
//!         NumberInput,
//!     )
//!     .row(RowProps::new("Replicas").required())],
//! );
//!
//! let rendered = form.render();
//! assert_eq!(rendered.rows[0].label, "Replicas");
//!
//! form.handle_input("replicas", json!("2"));
//! assert_eq!(store.get_value("replicas"), Some(json!(2)));
//! assert!(block_on(form.validate_promise()).is_valid());
//! ```

mod advanced;
mod controls;
pub mod schema;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ErrorMap;
use crate::path::FieldName;
use crate::store::{FieldDescriptor, FieldStatus, FieldStore};
use crate::validation::ValidateResult;

pub use advanced::{AdvancedSettings, AdvancedSettingsError};
pub use controls::{
    ComboBoxSingle, ControlView, FieldControl, NumberInput, Select, SelectOption, StaticText,
    Switch, TextInput,
};

/// Error-map key for raw editor failures.
pub const ADVANCED_SETTINGS_KEY: &str = "_advancedSettings";

/// How a row marks whether its field must be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Decoration {
    Required,
    Optional,
}

/// Presentation around a control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowProps {
    pub label: String,
    pub help_text: Option<String>,
    pub decoration: Option<Decoration>,
}

impl RowProps {
    /// Row props with a label and no decoration.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Sets the line shown under the control.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Marks the row as required.
    pub fn required(mut self) -> Self {
        self.decoration = Some(Decoration::Required);
        self
    }

    /// Marks the row as optional.
    pub fn optional(mut self) -> Self {
        self.decoration = Some(Decoration::Optional);
        self
    }
}

/// One field of a generated form.
#[derive(Clone)]
pub struct FieldSpec {
    pub descriptor: FieldDescriptor,
    pub control: Arc<dyn FieldControl>,
    pub row: RowProps,
}

impl FieldSpec {
    /// Pairs a descriptor with a control.
    pub fn new(descriptor: FieldDescriptor, control: impl FieldControl + 'static) -> Self {
        Self::with_control(descriptor, Arc::new(control))
    }

    /// Like [`new`](Self::new) for an already shared control.
    pub fn with_control(descriptor: FieldDescriptor, control: Arc<dyn FieldControl>) -> Self {
        Self {
            descriptor,
            control,
            row: RowProps::default(),
        }
    }

    /// Sets the row presentation.
    pub fn row(mut self, row: RowProps) -> Self {
        self.row = row;
        self
    }

    /// The field this spec binds.
    pub fn name(&self) -> &FieldName {
        &self.descriptor.name
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("descriptor", &self.descriptor)
            .field("control", &self.control.kind())
            .field("row", &self.row)
            .finish()
    }
}

/// A rendered field row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    pub name: String,
    pub label: String,
    pub help_text: Option<String>,
    pub decoration: Option<Decoration>,
    pub errors: Option<Vec<String>>,
    pub is_invalid: bool,
    pub status: FieldStatus,
    pub control: ControlView,
}

/// The raw editor as rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedView {
    pub text: String,
    pub errors: Option<Vec<String>>,
}

/// Everything a view needs to draw the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedForm {
    pub rows: Vec<FieldRow>,
    pub advanced: Option<AdvancedView>,
}

/// Binds field specs to a store.
pub struct FormGenerator {
    store: FieldStore,
    specs: Vec<FieldSpec>,
    advanced: Option<AdvancedSettings>,
}

impl FormGenerator {
    /// A generator over `specs`, without a raw editor.
    pub fn new(store: FieldStore, specs: Vec<FieldSpec>) -> Self {
        Self {
            store,
            specs,
            advanced: None,
        }
    }

    /// Adds the raw JSON editor below the typed rows.
    pub fn with_advanced_settings(mut self, advanced: AdvancedSettings) -> Self {
        self.advanced = Some(advanced);
        self
    }

    /// The store the fields are bound to.
    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    /// The field specs, in row order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// The raw editor, if configured.
    pub fn advanced_settings(&self) -> Option<&AdvancedSettings> {
        self.advanced.as_ref()
    }

    /// Registers every field and builds the render model.
    pub fn render(&self) -> RenderedForm {
        let rows = self
            .specs
            .iter()
            .map(|spec| {
                let binding = self.store.register_field(spec.descriptor.clone());
                FieldRow {
                    name: spec.name().serialize(),
                    label: spec.row.label.clone(),
                    help_text: spec.row.help_text.clone(),
                    decoration: spec.row.decoration,
                    errors: binding.errors().map(<[String]>::to_vec),
                    is_invalid: binding.is_invalid(),
                    status: binding.status(),
                    control: spec.control.render(&binding),
                }
            })
            .collect();

        let advanced = self.advanced.as_ref().map(|advanced| AdvancedView {
            text: advanced.editor_text(&self.store),
            errors: advanced.validate(&self.store),
        });

        RenderedForm { rows, advanced }
    }

    /// Routes raw control input to its field. Returns false for unknown names.
    pub fn handle_input(&self, name: impl Into<FieldName>, raw: serde_json::Value) -> bool {
        let Some(spec) = self.find(&name.into()) else {
            return false;
        };
        let binding = self.store.register_field(spec.descriptor.clone());
        binding.on_change(spec.control.from_input(raw));
        true
    }

    /// Routes a blur to its field. Returns false for unknown names.
    pub fn handle_blur(&self, name: impl Into<FieldName>) -> bool {
        let Some(spec) = self.find(&name.into()) else {
            return false;
        };
        self.store.register_field(spec.descriptor.clone()).on_blur();
        true
    }

    /// Applies raw editor text. Without an editor configured this is a no-op.
    pub fn apply_advanced_text(&self, text: &str) -> Result<(), AdvancedSettingsError> {
        match &self.advanced {
            Some(advanced) => advanced.apply_text(&self.store, text),
            None => Ok(()),
        }
    }

    /// Validates the typed fields and folds in the raw editor's state.
    pub fn validate_promise(&self) -> impl Future<Output = ValidateResult> + Send + 'static {
        for spec in &self.specs {
            self.store.register_field(spec.descriptor.clone());
        }
        let names: Vec<FieldName> = self.specs.iter().map(|spec| spec.name().clone()).collect();
        let typed = self.store.validate_promise(Some(&names));

        let mut advanced_errors = ErrorMap::new();
        if let Some(messages) = self
            .advanced
            .as_ref()
            .and_then(|advanced| advanced.validate(&self.store))
        {
            advanced_errors.insert(ADVANCED_SETTINGS_KEY.to_string(), messages);
        }

        async move { typed.await.merge_errors(advanced_errors) }
    }

    fn find(&self, name: &FieldName) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.name() == name)
    }
}

impl fmt::Debug for FormGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormGenerator")
            .field("specs", &self.specs)
            .field("advanced", &self.advanced)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::store::FieldStoreOptions;
    use futures::executor::block_on;
    use serde_json::json;

    fn form(store: &FieldStore) -> FormGenerator {
        FormGenerator::new(
            store.clone(),
            vec![
                FieldSpec::new(
                    FieldDescriptor::new("index").rule(Rule::new().required().message("required")),
                    TextInput,
                )
                .row(RowProps::new("Index name").help_text("Lowercase only").required()),
                FieldSpec::new(FieldDescriptor::new("hidden").initial_value(json!(true)), Switch),
            ],
        )
    }

    #[test]
    fn test_render_registers_fields() {
        let store = FieldStore::new(json!({}));
        let rendered = form(&store).render();

        assert_eq!(store.registered_names().len(), 2);
        assert_eq!(rendered.rows[0].name, "index");
        assert_eq!(rendered.rows[0].control.value, json!(""));
        assert_eq!(rendered.rows[0].decoration, Some(Decoration::Required));
        assert_eq!(rendered.rows[1].control.value, json!(true));
        assert!(rendered.advanced.is_none());
    }

    #[test]
    fn test_render_surfaces_errors() {
        let store = FieldStore::with_options(FieldStoreOptions::new().auto_validate(false));
        let form = form(&store);
        form.render();
        block_on(form.validate_promise());

        let rendered = form.render();
        assert!(rendered.rows[0].is_invalid);
        assert_eq!(rendered.rows[0].errors, Some(vec!["required".to_string()]));
        assert_eq!(rendered.rows[0].status, FieldStatus::Invalid);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let store = FieldStore::new(json!({}));
        let form = form(&store);
        assert!(!form.handle_input("missing", json!(1)));
        assert!(!form.handle_blur("missing"));
        assert_eq!(store.get_values(None), json!({}));
    }

    #[test]
    fn test_combined_validation() {
        let store = FieldStore::new(json!({"index": "logs"}));
        let form = form(&store).with_advanced_settings(AdvancedSettings::new().block("index"));
        assert!(block_on(form.validate_promise()).is_valid());

        assert!(form.apply_advanced_text("{oops").is_err());
        let result = block_on(form.validate_promise());
        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key(ADVANCED_SETTINGS_KEY));
    }
}
