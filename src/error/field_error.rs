//! Field validation error types.
//!
//! This module provides [`FieldError`] for a single rule failure and
//! [`FieldErrors`] for accumulating every failure of one field.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use stillwater::prelude::*;

use crate::path::FieldName;

/// Error messages keyed by serialized field name, in first-failure order.
pub type ErrorMap = IndexMap<String, Vec<String>>;

/// A single rule failure with full context.
///
/// `FieldError` captures:
/// - **name**: the field whose rule failed
/// - **message**: the text shown next to the input
/// - **code**: which rule family produced it (`required`, `format`, `min`,
///   `max`, `min_length`, `max_length`, `length`, `pattern`, `validator`)
///
/// # Example
///
/// ```rust
/// use formfield::{FieldError, FieldName};
///
/// let error = FieldError::new(FieldName::from("alias"), "alias is required")
///     .with_code("required");
///
/// assert_eq!(error.code, "required");
/// assert_eq!(error.to_string(), "alias: alias is required");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// The field that failed validation.
    pub name: FieldName,
    /// Human-readable error message.
    pub message: String,
    /// Machine-readable error code.
    pub code: String,
}

impl FieldError {
    /// Creates a new field error. The code defaults to "validation_error".
    pub fn new(name: FieldName, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
            code: "validation_error".to_string(),
        }
    }

    /// Sets the error code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for FieldError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<FieldError>();
    assert_sync::<FieldError>();
};

/// A non-empty collection of rule failures.
///
/// `FieldErrors` wraps a `NonEmptyVec<FieldError>` so a failed
/// `Validation<(), FieldErrors>` always carries at least one message, and
/// implements `Semigroup` so the results of independent rules fold together
/// without short-circuiting.
///
/// ```rust
/// use formfield::{FieldError, FieldErrors, FieldName};
/// use stillwater::prelude::*;
///
/// let name = FieldName::from("shards");
/// let first = FieldErrors::single(FieldError::new(name.clone(), "shards is required"));
/// let second = FieldErrors::single(FieldError::new(name, "shards must be a number"));
///
/// let combined = first.combine(second);
/// assert_eq!(combined.messages(), vec!["shards is required", "shards must be a number"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldErrors(NonEmptyVec<FieldError>);

impl FieldErrors {
    /// Creates a `FieldErrors` containing a single error.
    pub fn single(error: FieldError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Creates a `FieldErrors` from a vec, or `None` when it is empty.
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns the first error.
    pub fn first(&self) -> &FieldError {
        self.0.head()
    }

    /// Returns all errors with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&FieldError> {
        self.0.iter().filter(|e| e.code == code).collect()
    }

    /// Returns the messages in order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }

    /// Converts this collection into a `Vec<FieldError>`.
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0.into_vec()
    }
}

impl Semigroup for FieldErrors {
    fn combine(self, other: Self) -> Self {
        FieldErrors(self.0.combine(other.0))
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}
