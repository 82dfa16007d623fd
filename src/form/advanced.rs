//! Raw JSON editing of the value tree alongside the typed controls.
//!
//! The editor shows the tree minus the blocked names, which belong to typed
//! controls. Applying editor text rebuilds the tree as the parsed object plus
//! the current values of the blocked names, so neither surface drops the
//! other's fields. Text that does not parse leaves the tree untouched and
//! sets the `_advancedSettings` error instead.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::ADVANCED_SETTINGS_KEY;
use crate::path::{self, FieldName};
use crate::store::FieldStore;

/// Why editor text was rejected.
#[derive(Debug, Error)]
pub enum AdvancedSettingsError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Advanced settings must be a JSON object")]
    NotAnObject,
}

/// The raw editor's configuration and its last rejected text.
#[derive(Debug, Default)]
pub struct AdvancedSettings {
    blocked_names: Vec<FieldName>,
    draft: Mutex<Option<String>>,
}

impl AdvancedSettings {
    /// An editor with nothing blocked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides a field from the editor and protects it from being overwritten.
    pub fn block(mut self, name: impl Into<FieldName>) -> Self {
        self.blocked_names.push(name.into());
        self
    }

    /// Blocks several names at once.
    pub fn block_all<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FieldName>,
    {
        self.blocked_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Names the editor never shows or writes.
    pub fn blocked_names(&self) -> &[FieldName] {
        &self.blocked_names
    }

    /// The tree without blocked names, pretty-printed.
    pub fn editor_value(&self, store: &FieldStore) -> Value {
        let mut tree = store.get_values(None);
        for name in &self.blocked_names {
            path::remove(&mut tree, name);
        }
        tree
    }

    /// What the editor should show.
    ///
    /// While the last applied text is still rejected, that text is shown
    /// as typed so the user can fix it.
    pub fn editor_text(&self, store: &FieldStore) -> String {
        if store.get_error(ADVANCED_SETTINGS_KEY).is_some() {
            if let Some(draft) = self.draft.lock().clone() {
                return draft;
            }
        }
        serde_json::to_string_pretty(&self.editor_value(store)).unwrap_or_default()
    }

    /// Parses editor text and merges it into the store.
    pub fn apply_text(&self, store: &FieldStore, text: &str) -> Result<(), AdvancedSettingsError> {
        match self.merge(store, text) {
            Ok(tree) => {
                *self.draft.lock() = None;
                store.replace_values(tree);
                if store.get_error(ADVANCED_SETTINGS_KEY).is_some() {
                    store.set_error(ADVANCED_SETTINGS_KEY, Vec::new());
                }
                Ok(())
            }
            Err(err) => {
                tracing::debug!(error = %err, "rejected advanced settings text");
                *self.draft.lock() = Some(text.to_string());
                store.set_error(ADVANCED_SETTINGS_KEY, vec![err.to_string()]);
                Err(err)
            }
        }
    }

    fn merge(&self, store: &FieldStore, text: &str) -> Result<Value, AdvancedSettingsError> {
        let mut tree = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Value::Object(map),
            Value::Null => Value::Object(Map::new()),
            _ => return Err(AdvancedSettingsError::NotAnObject),
        };
        let current = store.get_values(None);
        for name in &self.blocked_names {
            path::remove(&mut tree, name);
            if let Some(value) = path::get(&current, name) {
                path::set(&mut tree, name, value.clone());
            }
        }
        Ok(tree)
    }

    /// The editor's current error messages, if any.
    pub fn validate(&self, store: &FieldStore) -> Option<Vec<String>> {
        store
            .get_error(ADVANCED_SETTINGS_KEY)
            .filter(|messages| !messages.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_editor_hides_blocked_names() {
        let store = FieldStore::new(json!({"x": 1, "y": {"z": 2}}));
        let advanced = AdvancedSettings::new().block("x");
        assert_eq!(advanced.editor_value(&store), json!({"y": {"z": 2}}));
    }

    #[test]
    fn test_blocked_names_cannot_be_overwritten() {
        let store = FieldStore::new(json!({"x": 1}));
        let advanced = AdvancedSettings::new().block("x");
        advanced.apply_text(&store, r#"{"x": 99, "y": 2}"#).unwrap();
        assert_eq!(store.get_values(None), json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_rejected_text_is_kept_for_editing() {
        let store = FieldStore::new(json!({"x": 1}));
        let advanced = AdvancedSettings::new().block("x");

        assert!(advanced.apply_text(&store, "{").is_err());
        assert_eq!(advanced.editor_text(&store), "{");
        assert!(advanced.validate(&store).is_some());

        advanced.apply_text(&store, "{}").unwrap();
        assert!(advanced.validate(&store).is_none());
        assert_eq!(advanced.editor_text(&store), "{}");
    }

    #[test]
    fn test_non_object_is_rejected() {
        let store = FieldStore::new(json!({"x": 1}));
        let advanced = AdvancedSettings::new();
        let err = advanced.apply_text(&store, "[1, 2]").unwrap_err();
        assert!(matches!(err, AdvancedSettingsError::NotAnObject));
        assert_eq!(store.get_values(None), json!({"x": 1}));
        assert_eq!(
            store.get_error(ADVANCED_SETTINGS_KEY),
            Some(vec!["Advanced settings must be a JSON object".to_string()])
        );
    }
}
