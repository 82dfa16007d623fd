//! Whole-form validation results.

use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorMap;

/// What a whole-form validation resolves to.
///
/// `errors` is `None` exactly when no field failed; otherwise it holds only
/// the failing fields, keyed by serialized name. `values` is a snapshot of
/// the value tree taken once every field has finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateResult {
    pub errors: Option<ErrorMap>,
    pub values: Value,
}

impl ValidateResult {
    /// True when no field failed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }

    /// Messages for one serialized field name.
    pub fn field_errors(&self, key: &str) -> Option<&[String]> {
        self.errors.as_ref()?.get(key).map(Vec::as_slice)
    }

    /// Folds another result's errors into this one, keeping this tree.
    pub fn merge_errors(mut self, errors: ErrorMap) -> Self {
        if errors.is_empty() {
            return self;
        }
        self.errors.get_or_insert_with(ErrorMap::new).extend(errors);
        self
    }
}
