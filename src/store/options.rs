//! Construction options for [`FieldStore`](super::FieldStore).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::path::FieldName;

/// Callback invoked with a field name and its new value.
pub type ChangeCallback = Arc<dyn Fn(&FieldName, &Value) + Send + Sync>;

/// Runs a fire-and-forget task, such as live validation after a keystroke.
pub type Spawner = Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>;

/// Options for creating a store.
///
/// # Example
///
/// ```rust
/// use formfield::{FieldStore, FieldStoreOptions};
/// use serde_json::json;
///
/// let store = FieldStore::with_options(
///     FieldStoreOptions::new()
///         .values(json!({"index": "logs-000001"}))
///         .on_change(|name, value| println!("{name} -> {value}"))
///         .auto_validate(false),
/// );
/// assert_eq!(store.get_value("index"), Some(json!("logs-000001")));
/// ```
#[derive(Clone)]
pub struct FieldStoreOptions {
    pub values: Value,
    pub on_change: Option<ChangeCallback>,
    pub on_before_change: Option<ChangeCallback>,
    pub auto_validate: bool,
    pub spawner: Option<Spawner>,
}

impl FieldStoreOptions {
    /// Creates options with an empty tree and live validation enabled.
    pub fn new() -> Self {
        Self {
            values: Value::Object(Map::new()),
            on_change: None,
            on_before_change: None,
            auto_validate: true,
            spawner: None,
        }
    }

    /// Seeds the value tree. `null` is treated as an empty object.
    pub fn values(mut self, values: Value) -> Self {
        self.values = if values.is_null() {
            Value::Object(Map::new())
        } else {
            values
        };
        self
    }

    /// Called once per changed leaf after a write lands in the tree.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldName, &Value) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Called once per written leaf before the write is applied.
    pub fn on_before_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldName, &Value) + Send + Sync + 'static,
    {
        self.on_before_change = Some(Arc::new(callback));
        self
    }

    /// Enables or disables validation on every bound-control change.
    pub fn auto_validate(mut self, enabled: bool) -> Self {
        self.auto_validate = enabled;
        self
    }

    /// Sets how live validations are driven.
    ///
    /// Without a spawner they are spawned onto the current tokio runtime, or
    /// run to completion inline when no runtime is active. Inside another
    /// `futures` executor a task that does not finish on its first poll is
    /// completed on a helper thread.
    pub fn spawner<F>(mut self, spawner: F) -> Self
    where
        F: Fn(BoxFuture<'static, ()>) + Send + Sync + 'static,
    {
        self.spawner = Some(Arc::new(spawner));
        self
    }
}

impl Default for FieldStoreOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStoreOptions")
            .field("values", &self.values)
            .field("on_change", &self.on_change.is_some())
            .field("on_before_change", &self.on_before_change.is_some())
            .field("auto_validate", &self.auto_validate)
            .field("spawner", &self.spawner.is_some())
            .finish()
    }
}

/// Drives a detached task with the configured spawner, the current tokio
/// runtime, or inline.
///
/// Inline means `block_on` on this thread, unless the caller is already inside
/// a `futures` executor. There the task is polled once and, if it is still
/// pending, finished on a helper thread.
pub(crate) fn spawn_detached(spawner: Option<&Spawner>, task: BoxFuture<'static, ()>) {
    if let Some(spawner) = spawner {
        spawner(task);
        return;
    }
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(task);
        return;
    }
    match futures::executor::enter() {
        Ok(guard) => {
            drop(guard);
            futures::executor::block_on(task);
        }
        Err(_) => {
            let mut task = task;
            if (&mut task).now_or_never().is_none() {
                tracing::debug!("detached task pending inside an executor; finishing on a helper thread");
                std::thread::spawn(move || futures::executor::block_on(task));
            }
        }
    }
}
