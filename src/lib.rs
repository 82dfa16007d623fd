//! # Formfield
//!
//! A form state and validation engine that reports ALL failing rules of a
//! field at once instead of stopping at the first one.
//!
//! ## Overview
//!
//! A [`FieldStore`] owns one form's nested value tree, its error map and the
//! fields registered against it. Fields are addressed by [`FieldName`]
//! paths, validated by ordered lists of [`Rule`]s whose failures accumulate
//! through stillwater's `Validation`, and bound to controls by the
//! [`form::FormGenerator`], which can also expose the tree as raw JSON for
//! settings the typed controls do not cover.
//!
//! ## Core Types
//!
//! - [`FieldName`]: a path into the value tree (e.g. `["settings", "index.number_of_shards"]`)
//! - [`Rule`]: one validation unit (required, pattern, bounds, format, custom validator)
//! - [`FieldStore`]: values, errors, registered fields and change notification
//! - [`form::FormGenerator`]: renders field specs bound to a store
//!
//! ## Example
//!
//! ```rust
//! use formfield::{FieldDescriptor, FieldStore, Rule};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let store = FieldStore::new(json!({"n": "3"}));
//! store.register_field(FieldDescriptor::new("n").rule(Rule::new().min(1.0).max(5.0)));
//! assert!(block_on(store.validate_promise(None)).is_valid());
//!
//! store.set_value("n", json!("9"));
//! let result = block_on(store.validate_promise(None));
//! assert_eq!(result.errors.unwrap()["n"], vec!["n must be less than or equal to 5"]);
//! ```

pub mod debounce;
pub mod error;
pub mod form;
pub mod path;
pub mod rules;
pub mod service;
pub mod store;
pub mod validation;

pub use debounce::Debouncer;
pub use error::{ErrorMap, FieldError, FieldErrors};
pub use path::{FieldName, PathSegment};
pub use rules::{CustomValidator, Format, Rule, Trigger, Validity};
pub use store::{
    FieldBinding, FieldDescriptor, FieldStatus, FieldStore, FieldStoreOptions, StoreEvent,
    SubscriptionId,
};
pub use validation::ValidateResult;

/// Type alias for rule-set results.
pub type ValidationResult<T> = stillwater::Validation<T, FieldErrors>;
