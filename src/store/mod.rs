//! The field store: values, errors and registered fields of one form.
//!
//! A [`FieldStore`] is created by the page or modal that owns the form and
//! handed by reference (it is a cheap `Clone` handle) to nested sections. All
//! reads and writes go through it so that change callbacks, subscriber
//! notifications and the error map stay consistent with the value tree.
//!
//! # Validation ordering
//!
//! Validation is asynchronous and a field may be revalidated while an older
//! run is still in flight. Every run takes a per-field generation number when
//! it starts; when it resolves, its result is stored only if no newer run for
//! the same field has started since. A slow, stale run therefore never
//! overwrites a newer result.
//!
//! # Example
//!
//! ```rust
//! use formfield::{FieldDescriptor, FieldName, FieldStore, Rule};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let store = FieldStore::new(json!({}));
//! store.register_field(
//!     FieldDescriptor::new(["a", "b"]).rule(Rule::new().required().message("Required")),
//! );
//!
//! let result = block_on(store.validate_promise(None));
//! assert_eq!(result.errors.unwrap()["a.b"], vec!["Required"]);
//!
//! store.set_value(["a", "b"], json!("x"));
//! let result = block_on(store.validate_promise(None));
//! assert!(result.errors.is_none());
//! ```

mod descriptor;
mod events;
mod options;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ErrorMap;
use crate::path::{self, FieldName};
use crate::rules::{engine, Rule, Trigger};
use crate::validation::ValidateResult;

pub use descriptor::{FieldBinding, FieldDescriptor, ValueTransform};
pub use events::{StoreEvent, SubscriptionId};
pub use options::{ChangeCallback, FieldStoreOptions, Spawner};

use events::{Listener, Listeners};

/// Where a field is in its validation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldStatus {
    Untouched,
    Validating,
    Valid,
    Invalid,
}

struct FieldEntry {
    descriptor: FieldDescriptor,
    generation: u64,
    status: FieldStatus,
}

struct StoreState {
    values: Value,
    errors: ErrorMap,
    fields: IndexMap<String, FieldEntry>,
    destroyed: bool,
}

struct Inner {
    state: Mutex<StoreState>,
    listeners: Mutex<Listeners>,
    version: AtomicU64,
    /// Store-wide, so a name that is unregistered and registered again never
    /// hands out a generation an older run already holds.
    generations: AtomicU64,
    auto_validate: AtomicBool,
    on_change: Option<ChangeCallback>,
    on_before_change: Option<ChangeCallback>,
    spawner: Option<Spawner>,
}

/// A run that has claimed a generation and snapshotted its inputs.
struct PendingRun {
    key: String,
    name: FieldName,
    generation: u64,
    rules: Vec<Rule>,
    value: Option<Value>,
    values: Value,
}

/// The reactive container behind a form.
#[derive(Clone)]
pub struct FieldStore {
    inner: Arc<Inner>,
}

impl FieldStore {
    /// Creates a store seeded with `values`.
    pub fn new(values: Value) -> Self {
        Self::with_options(FieldStoreOptions::new().values(values))
    }

    /// Creates a store from explicit options.
    pub fn with_options(options: FieldStoreOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState {
                    values: options.values,
                    errors: ErrorMap::new(),
                    fields: IndexMap::new(),
                    destroyed: false,
                }),
                listeners: Mutex::new(Listeners::default()),
                version: AtomicU64::new(0),
                generations: AtomicU64::new(0),
                auto_validate: AtomicBool::new(options.auto_validate),
                on_change: options.on_change,
                on_before_change: options.on_before_change,
                spawner: options.spawner,
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Records or updates a field and returns what its control needs.
    ///
    /// Called on every render; repeated calls for one name keep a single
    /// registry entry and leave its errors and generation untouched.
    pub fn register_field(&self, descriptor: FieldDescriptor) -> FieldBinding {
        let name = descriptor.name.clone();
        let key = name.serialize();
        let mut state = self.inner.state.lock();

        let status = match state.fields.get_mut(&key) {
            Some(entry) => {
                entry.descriptor = descriptor.clone();
                entry.status
            }
            None => {
                if let Some(initial) = &descriptor.initial_value {
                    if path::get(&state.values, &name).is_none() {
                        path::set(&mut state.values, &name, initial.clone());
                    }
                }
                tracing::debug!(field = %key, rules = descriptor.rules.len(), "registered field");
                state.fields.insert(
                    key.clone(),
                    FieldEntry {
                        descriptor: descriptor.clone(),
                        generation: 0,
                        status: FieldStatus::Untouched,
                    },
                );
                FieldStatus::Untouched
            }
        };

        let raw = path::get(&state.values, &name)
            .cloned()
            .unwrap_or(Value::Null);
        let errors = state.errors.get(&key).cloned();
        drop(state);

        let value = match &descriptor.to_control {
            Some(transform) => transform(&raw),
            None => raw,
        };

        FieldBinding {
            errors,
            name,
            value,
            status,
            props: descriptor.props,
            from_control: descriptor.from_control,
            store: self.clone(),
        }
    }

    /// Removes a field from the registry along with its error.
    pub fn unregister_field(&self, name: impl Into<FieldName>) -> bool {
        let key = name.into().serialize();
        let removed = {
            let mut state = self.inner.state.lock();
            state.errors.shift_remove(&key);
            state.fields.shift_remove(&key).is_some()
        };
        if removed {
            self.notify(StoreEvent::Errors { names: vec![key] });
        }
        removed
    }

    /// True if a field is registered under `name`.
    pub fn is_registered(&self, name: impl Into<FieldName>) -> bool {
        let key = name.into().serialize();
        self.inner.state.lock().fields.contains_key(&key)
    }

    /// Names of all registered fields, in registration order.
    pub fn registered_names(&self) -> Vec<FieldName> {
        self.inner
            .state
            .lock()
            .fields
            .values()
            .map(|entry| entry.descriptor.name.clone())
            .collect()
    }

    /// A copy of the descriptor registered under `name`.
    pub fn descriptor(&self, name: impl Into<FieldName>) -> Option<FieldDescriptor> {
        let key = name.into().serialize();
        self.inner
            .state
            .lock()
            .fields
            .get(&key)
            .map(|entry| entry.descriptor.clone())
    }

    // ---------------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------------

    /// Reads one value; `None` when the location is missing.
    pub fn get_value(&self, name: impl Into<FieldName>) -> Option<Value> {
        let name = name.into();
        path::get(&self.inner.state.lock().values, &name).cloned()
    }

    /// Reads the whole tree, or a tree holding only `names`.
    pub fn get_values(&self, names: Option<&[FieldName]>) -> Value {
        let state = self.inner.state.lock();
        match names {
            None => state.values.clone(),
            Some(names) => {
                let mut out = Value::Object(Map::new());
                for name in names {
                    if let Some(value) = path::get(&state.values, name) {
                        path::set(&mut out, name, value.clone());
                    }
                }
                out
            }
        }
    }

    /// Writes one value.
    pub fn set_value(&self, name: impl Into<FieldName>, value: Value) {
        self.write_leaves(vec![(name.into(), value)]);
    }

    /// Writes every leaf of a partial tree with a single notification.
    ///
    /// Objects are walked; arrays and scalars are written as whole values.
    pub fn set_values(&self, partial: Value) {
        self.write_leaves(path::leaves(&partial));
    }

    /// Replaces the tree, reporting each changed or removed leaf to
    /// `on_change`. Errors are kept.
    pub fn replace_values(&self, tree: Value) {
        if self.is_destroyed() {
            return;
        }
        if let Some(hook) = &self.inner.on_before_change {
            hook(&FieldName::root(), &tree);
        }

        let changed = {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            let changed = diff_leaves(&state.values, &tree);
            state.values = tree;
            changed
        };
        self.after_write(changed);
    }

    /// Replaces the tree for a load or discard flow.
    ///
    /// Errors and statuses are cleared and in-flight validations are
    /// invalidated. Nothing is re-validated and `on_change` is not called.
    pub fn reset_values(&self, tree: Value) {
        {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            state.values = tree;
            state.errors.clear();
            for entry in state.fields.values_mut() {
                entry.generation = self.next_generation();
                entry.status = FieldStatus::Untouched;
            }
        }
        self.notify(StoreEvent::Reset);
    }

    fn write_leaves(&self, leaves: Vec<(FieldName, Value)>) {
        if self.is_destroyed() {
            return;
        }
        if let Some(hook) = &self.inner.on_before_change {
            for (name, value) in &leaves {
                hook(name, value);
            }
        }

        let changed = {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            let mut changed = Vec::new();
            for (name, value) in leaves {
                if path::get(&state.values, &name) != Some(&value) {
                    path::set(&mut state.values, &name, value.clone());
                    changed.push((name, value));
                }
            }
            changed
        };
        self.after_write(changed);
    }

    fn after_write(&self, changed: Vec<(FieldName, Value)>) {
        if changed.is_empty() {
            return;
        }
        if let Some(callback) = &self.inner.on_change {
            for (name, value) in &changed {
                callback(name, value);
            }
        }
        self.notify(StoreEvent::Values {
            names: changed.into_iter().map(|(name, _)| name).collect(),
        });
    }

    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------

    /// Runs every rule of a field and stores the merged messages.
    ///
    /// The generation is claimed when this is called, not when the returned
    /// future is first polled. The future resolves to this run's messages even
    /// if a newer run superseded it before it could be stored.
    pub fn validate_field(
        &self,
        name: impl Into<FieldName>,
    ) -> impl Future<Output = Vec<String>> + Send + 'static {
        self.run_validation(name.into(), None)
    }

    /// Runs only the rules that fire on `trigger`.
    pub fn validate_field_on(
        &self,
        name: impl Into<FieldName>,
        trigger: Trigger,
    ) -> impl Future<Output = Vec<String>> + Send + 'static {
        self.run_validation(name.into(), Some(trigger))
    }

    /// Validates the given fields, or every registered field, concurrently.
    ///
    /// `errors` is `None` only when no field failed.
    pub fn validate_promise(
        &self,
        names: Option<&[FieldName]>,
    ) -> impl Future<Output = ValidateResult> + Send + 'static {
        let targets = match names {
            Some(names) => names.to_vec(),
            None => self.registered_names(),
        };
        let keys: Vec<String> = targets.iter().map(FieldName::serialize).collect();
        let runs: Vec<_> = targets
            .into_iter()
            .map(|name| self.run_validation(name, None))
            .collect();
        let store = self.clone();

        async move {
            let results = join_all(runs).await;
            let errors: ErrorMap = keys
                .into_iter()
                .zip(results)
                .filter(|(_, messages)| !messages.is_empty())
                .collect();
            ValidateResult {
                errors: if errors.is_empty() { None } else { Some(errors) },
                values: store.get_values(None),
            }
        }
    }

    fn run_validation(
        &self,
        name: FieldName,
        trigger: Option<Trigger>,
    ) -> impl Future<Output = Vec<String>> + Send + 'static {
        let run = self.begin_validation(name, trigger);
        let store = self.clone();
        async move {
            let Some(run) = run else {
                return Vec::new();
            };
            let result =
                engine::validate_rules(&run.name, &run.rules, run.value.as_ref(), &run.values)
                    .await;
            let messages = engine::messages(result);
            store.finish_validation(&run, &messages);
            messages
        }
    }

    fn begin_validation(&self, name: FieldName, trigger: Option<Trigger>) -> Option<PendingRun> {
        let key = name.serialize();
        let mut state = self.inner.state.lock();
        if state.destroyed {
            return None;
        }

        let StoreState { values, fields, .. } = &mut *state;
        let Some(entry) = fields.get_mut(&key) else {
            tracing::warn!(field = %key, "validation requested for unregistered field");
            return None;
        };

        let rules: Vec<Rule> = entry
            .descriptor
            .rules
            .iter()
            .filter(|rule| trigger.map_or(true, |t| rule.runs_on(t)))
            .cloned()
            .collect();
        if trigger.is_some() && rules.is_empty() {
            return None;
        }

        entry.generation = self.next_generation();
        entry.status = FieldStatus::Validating;
        Some(PendingRun {
            generation: entry.generation,
            value: path::get(values, &name).cloned(),
            values: values.clone(),
            key,
            name,
            rules,
        })
    }

    fn next_generation(&self) -> u64 {
        self.inner.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish_validation(&self, run: &PendingRun, messages: &[String]) {
        let applied = {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            let current = state.fields.get(&run.key).map(|entry| entry.generation);
            if current != Some(run.generation) {
                tracing::debug!(
                    field = %run.key,
                    generation = run.generation,
                    current = ?current,
                    "discarding stale validation result"
                );
                false
            } else {
                if let Some(entry) = state.fields.get_mut(&run.key) {
                    entry.status = if messages.is_empty() {
                        FieldStatus::Valid
                    } else {
                        FieldStatus::Invalid
                    };
                }
                if messages.is_empty() {
                    state.errors.shift_remove(&run.key);
                } else {
                    state.errors.insert(run.key.clone(), messages.to_vec());
                }
                true
            }
        };
        if applied {
            self.notify(StoreEvent::Errors {
                names: vec![run.key.clone()],
            });
        }
    }

    pub(crate) fn handle_change(&self, name: &FieldName, value: Value) {
        self.set_value(name, value);
        if self.inner.auto_validate.load(Ordering::SeqCst) && self.is_registered(name) {
            let run = self.validate_field_on(name, Trigger::Change);
            options::spawn_detached(
                self.inner.spawner.as_ref(),
                Box::pin(async move {
                    run.await;
                }),
            );
        }
    }

    pub(crate) fn handle_blur(&self, name: &FieldName) {
        if self.is_registered(name) {
            let run = self.validate_field_on(name, Trigger::Blur);
            options::spawn_detached(
                self.inner.spawner.as_ref(),
                Box::pin(async move {
                    run.await;
                }),
            );
        }
    }

    /// Turns live validation on control changes on or off.
    pub fn set_auto_validate(&self, enabled: bool) {
        self.inner.auto_validate.store(enabled, Ordering::SeqCst);
    }

    /// Where a field is in its validation cycle; unknown names are untouched.
    pub fn field_status(&self, name: impl Into<FieldName>) -> FieldStatus {
        let key = name.into().serialize();
        self.inner
            .state
            .lock()
            .fields
            .get(&key)
            .map_or(FieldStatus::Untouched, |entry| entry.status)
    }

    // ---------------------------------------------------------------------
    // Errors
    // ---------------------------------------------------------------------

    /// The cached messages for a field, without re-validating.
    pub fn get_error(&self, name: impl Into<FieldName>) -> Option<Vec<String>> {
        let key = name.into().serialize();
        self.inner.state.lock().errors.get(&key).cloned()
    }

    /// A copy of every cached error, keyed by serialized name.
    pub fn get_errors(&self) -> ErrorMap {
        self.inner.state.lock().errors.clone()
    }

    /// Injects messages for a field; an empty list clears it.
    pub fn set_error(&self, name: impl Into<FieldName>, messages: Vec<String>) {
        let key = name.into().serialize();
        {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            apply_error(&mut state, &key, messages);
        }
        self.notify(StoreEvent::Errors { names: vec![key] });
    }

    /// Injects messages for several fields with one notification.
    pub fn set_errors(&self, errors: ErrorMap) {
        let names: Vec<String> = errors.keys().cloned().collect();
        {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            for (key, messages) in errors {
                apply_error(&mut state, &key, messages);
            }
        }
        if !names.is_empty() {
            self.notify(StoreEvent::Errors { names });
        }
    }

    // ---------------------------------------------------------------------
    // Subscriptions and lifecycle
    // ---------------------------------------------------------------------

    /// Adds a listener called after every notifying change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.lock().add(Arc::new(listener))
    }

    /// Removes a listener; false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.lock().remove(id)
    }

    /// Bumped once per notification.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Tears the store down: later writes, validation results and
    /// notifications are dropped.
    pub fn destroy(&self) {
        self.inner.state.lock().destroyed = true;
        self.inner.listeners.lock().clear();
    }

    /// True once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.state.lock().destroyed
    }

    fn notify(&self, event: StoreEvent) {
        self.inner.version.fetch_add(1, Ordering::SeqCst);
        let listeners: Vec<Listener> = self.inner.listeners.lock().snapshot();
        for listener in listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FieldStore")
            .field("values", &state.values)
            .field("errors", &state.errors)
            .field("fields", &state.fields.keys().collect::<Vec<_>>())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

fn apply_error(state: &mut StoreState, key: &str, messages: Vec<String>) {
    let status = if messages.is_empty() {
        state.errors.shift_remove(key);
        FieldStatus::Valid
    } else {
        state.errors.insert(key.to_string(), messages);
        FieldStatus::Invalid
    };
    if let Some(entry) = state.fields.get_mut(key) {
        entry.status = status;
    }
}

/// Leaves of `new` that differ from `old`, then leaves of `old` that `new`
/// no longer has (reported as `null`).
fn diff_leaves(old: &Value, new: &Value) -> Vec<(FieldName, Value)> {
    let mut changed: Vec<(FieldName, Value)> = path::leaves(new)
        .into_iter()
        .filter(|(name, value)| path::get(old, name) != Some(value))
        .collect();
    changed.extend(
        path::leaves(old)
            .into_iter()
            .filter(|(name, _)| path::get(new, name).is_none())
            .map(|(name, _)| (name, Value::Null)),
    );
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Validity;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_register_is_idempotent() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        assert_eq!(store.registered_names(), vec![FieldName::from("a")]);

        block_on(store.validate_promise(None));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        assert_eq!(store.get_errors().len(), 1);
    }

    #[test]
    fn test_reregistration_replaces_rules() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        store.register_field(FieldDescriptor::new("a"));
        assert!(block_on(store.validate_field("a")).is_empty());
    }

    #[test]
    fn test_initial_value_only_fills_missing() {
        let store = FieldStore::new(json!({"kept": "server"}));
        store.register_field(FieldDescriptor::new("kept").initial_value(json!("default")));
        store.register_field(FieldDescriptor::new("filled").initial_value(json!(3)));
        assert_eq!(store.get_value("kept"), Some(json!("server")));
        assert_eq!(store.get_value("filled"), Some(json!(3)));
    }

    #[test]
    fn test_binding_applies_transforms() {
        let store = FieldStore::with_options(FieldStoreOptions::new().auto_validate(false));
        let binding = store.register_field(
            FieldDescriptor::new("size")
                .initial_value(json!("10gb"))
                .to_control(|v| json!(v.as_str().unwrap_or("").trim_end_matches("gb")))
                .from_control(|v| json!(format!("{}gb", v.as_str().unwrap_or("")))),
        );
        assert_eq!(binding.value(), &json!("10"));
        binding.on_change(json!("20"));
        assert_eq!(store.get_value("size"), Some(json!("20gb")));
    }

    #[test]
    fn test_to_control_may_read_the_store() {
        let store = FieldStore::new(json!({"unit": "gb", "size": 10}));
        let reader = store.clone();
        let binding = store.register_field(FieldDescriptor::new("size").to_control(move |v| {
            let unit = reader.get_value("unit").unwrap_or(Value::Null);
            json!(format!("{}{}", v, unit.as_str().unwrap_or("")))
        }));
        assert_eq!(binding.value(), &json!("10gb"));
    }

    #[test]
    fn test_on_change_inside_executor() {
        let store = FieldStore::new(json!({}));
        let binding = store.register_field(
            FieldDescriptor::new("a").rule(Rule::new().min_length(3).message("too short")),
        );

        block_on(async { binding.on_change(json!("x")) });

        assert_eq!(store.get_value("a"), Some(json!("x")));
        assert_eq!(store.get_error("a"), Some(vec!["too short".to_string()]));
    }

    #[test]
    fn test_destroyed_store_skips_before_change_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = FieldStore::with_options(FieldStoreOptions::new().on_before_change(
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));
        store.set_value("a", json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.destroy();
        store.set_value("a", json!(2));
        store.set_values(json!({"b": 1}));
        store.replace_values(json!({}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_values_subset() {
        let store = FieldStore::new(json!({"a": {"b": 1, "c": 2}, "d": 3}));
        let subset = store.get_values(Some(&[FieldName::from(["a", "b"]), FieldName::from("d")]));
        assert_eq!(subset, json!({"a": {"b": 1}, "d": 3}));
    }

    #[test]
    fn test_unchanged_write_is_silent() {
        let store = FieldStore::new(json!({"a": 1}));
        store.set_value("a", json!(1));
        assert_eq!(store.version(), 0);
        store.set_value("a", json!(2));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_replace_values_reports_removed_leaves() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let store = FieldStore::with_options(
            FieldStoreOptions::new()
                .values(json!({"a": 1, "b": 2}))
                .on_change(move |name, value| sink.lock().push((name.serialize(), value.clone()))),
        );
        store.replace_values(json!({"a": 1, "c": 3}));

        let changes = changes.lock();
        assert_eq!(
            *changes,
            vec![("c".to_string(), json!(3)), ("b".to_string(), Value::Null)]
        );
        assert_eq!(store.get_values(None), json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_reset_clears_errors_and_status() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        block_on(store.validate_field("a"));
        assert_eq!(store.field_status("a"), FieldStatus::Invalid);

        store.reset_values(json!({"a": "loaded"}));
        assert!(store.get_errors().is_empty());
        assert_eq!(store.field_status("a"), FieldStatus::Untouched);
        assert_eq!(store.get_value("a"), Some(json!("loaded")));
    }

    #[test]
    fn test_reset_discards_in_flight_run() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        let run = store.validate_field("a");
        store.reset_values(json!({}));
        assert_eq!(block_on(run), vec!["a is required"]);
        assert!(store.get_error("a").is_none());
    }

    #[test]
    fn test_set_error_and_clear() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("name"));
        store.set_error("name", vec!["already exists on the server".into()]);
        assert_eq!(store.field_status("name"), FieldStatus::Invalid);
        assert_eq!(
            store.get_error("name"),
            Some(vec!["already exists on the server".to_string()])
        );
        store.set_error("name", Vec::new());
        assert!(store.get_error("name").is_none());
    }

    #[test]
    fn test_validating_unregistered_field_is_empty() {
        let store = FieldStore::new(json!({}));
        assert!(block_on(store.validate_field("ghost")).is_empty());
        assert!(store.get_errors().is_empty());
    }

    #[test]
    fn test_status_cycle() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        assert_eq!(store.field_status("a"), FieldStatus::Untouched);

        let run = store.validate_field("a");
        assert_eq!(store.field_status("a"), FieldStatus::Validating);
        block_on(run);
        assert_eq!(store.field_status("a"), FieldStatus::Invalid);

        store.set_value("a", json!("x"));
        block_on(store.validate_field("a"));
        assert_eq!(store.field_status("a"), FieldStatus::Valid);
    }

    #[test]
    fn test_live_validation_runs_inline_without_runtime() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = FieldStore::new(json!({}));
        let binding = store.register_field(FieldDescriptor::new("a").rule(
            Rule::new().validator(move |_: &Rule, _: &Value, _: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Validity::Fail("nope".into())
            }),
        ));

        binding.on_change(json!("x"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_error("a"), Some(vec!["nope".to_string()]));

        store.set_auto_validate(false);
        binding.on_change(json!("y"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blur_runs_blur_rules_only_when_present() {
        let store = FieldStore::with_options(FieldStoreOptions::new().auto_validate(false));
        let binding = store.register_field(
            FieldDescriptor::new("a")
                .rule(Rule::new().required().trigger(Trigger::Submit).message("submit only")),
        );
        binding.on_blur();
        assert!(store.get_error("a").is_none());
        assert_eq!(store.field_status("a"), FieldStatus::Untouched);
    }

    #[test]
    fn test_destroy_drops_late_results() {
        let store = FieldStore::new(json!({}));
        store.register_field(FieldDescriptor::new("a").rule(Rule::new().required()));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let run = store.validate_field("a");
        store.destroy();
        block_on(run);
        store.set_value("a", json!(1));

        assert!(store.is_destroyed());
        assert!(store.get_errors().is_empty());
        assert_eq!(store.get_value("a"), None);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
