//! The result shape of remote calls made from custom validators.
//!
//! Remote checks such as "does this alias already exist" come back as
//! `{ok, response?, error?}`. A failed call is an ordinary validation
//! failure, never a panic or an error that escapes the form.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::{CustomValidator, Rule, Validity};

const REQUEST_FAILED: &str = "request failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ServerResponse<T> {
    /// A successful response.
    pub fn success(response: T) -> Self {
        Self {
            ok: true,
            response: Some(response),
            error: None,
        }
    }

    /// A failed response carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            response: None,
            error: Some(error.into()),
        }
    }

    /// `Ok` only for a successful call that carried a payload.
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.response) {
            (true, Some(response)) => Ok(response),
            (true, None) => Err("empty response".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| REQUEST_FAILED.to_string())),
        }
    }

    /// Turns the call into a validation message.
    ///
    /// A failed call yields its error text; a successful one is handed to
    /// `check`, which decides whether the payload means the value is bad.
    pub fn into_message<F>(self, check: F) -> Option<String>
    where
        F: FnOnce(&T) -> Option<String>,
    {
        if !self.ok {
            return Some(self.error.unwrap_or_else(|| REQUEST_FAILED.to_string()));
        }
        self.response.as_ref().and_then(check)
    }
}

/// Builds a validator backed by a remote call.
///
/// # Example
///
/// ```rust
/// use formfield::service::{remote_validator, ServerResponse};
/// use formfield::{FieldDescriptor, FieldStore, Rule};
/// use futures::executor::block_on;
/// use serde_json::json;
///
/// let exists = remote_validator(
///     |value| async move { ServerResponse::success(value == json!("logs")) },
///     |taken: &bool| taken.then(|| "alias already exists".to_string()),
/// );
/// let store = FieldStore::new(json!({"alias": "logs"}));
/// store.register_field(FieldDescriptor::new("alias").rule(Rule::new().validator(exists)));
///
/// assert_eq!(block_on(store.validate_field("alias")), vec!["alias already exists"]);
/// ```
pub fn remote_validator<F, Fut, T, C>(request: F, check: C) -> impl CustomValidator
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServerResponse<T>> + Send + 'static,
    T: Send + 'static,
    C: Fn(&T) -> Option<String> + Clone + Send + Sync + 'static,
{
    move |_: &Rule, value: &Value, _: &Value| {
        let call = request(value.clone());
        let check = check.clone();
        Validity::pending(async move { Ok(call.await.into_message(|payload| check(payload))) })
    }
}
