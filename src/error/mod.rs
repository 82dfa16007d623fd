//! Error types for validation failures.
//!
//! This module provides types for representing rule failures with their
//! field name, message and machine-readable code, and the [`ErrorMap`] the
//! store keeps for rendering.

mod field_error;

pub use field_error::{ErrorMap, FieldError, FieldErrors};
