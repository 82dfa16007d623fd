//! Caller-supplied validators.
//!
//! A [`CustomValidator`] receives the rule, the field's value and the whole
//! value tree, and answers with a [`Validity`]: pass, fail with a message, or
//! a pending future for checks that need I/O (for example asking the cluster
//! whether an alias already exists). Synchronous and asynchronous answers are
//! normalized to the same shape, and a validator that panics or resolves to
//! `Err` produces a field error instead of tearing down the validation run.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::Rule;

/// The future a pending validator resolves: `Ok(None)` passes, `Ok(Some(msg))`
/// fails with `msg`, `Err(msg)` is a failed check whose text is shown as-is.
pub type ValidatorFuture = BoxFuture<'static, Result<Option<String>, String>>;

/// The answer of a custom validator.
pub enum Validity {
    Pass,
    Fail(String),
    Pending(ValidatorFuture),
}

impl Validity {
    /// Wraps a future as a pending answer.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<String>, String>> + Send + 'static,
    {
        Validity::Pending(Box::pin(future))
    }
}

impl From<Option<String>> for Validity {
    fn from(message: Option<String>) -> Self {
        match message {
            Some(message) => Validity::Fail(message),
            None => Validity::Pass,
        }
    }
}

impl From<Result<(), String>> for Validity {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Validity::Pass,
            Err(message) => Validity::Fail(message),
        }
    }
}

/// A validator attached to a [`Rule`].
///
/// Implemented for every `Fn(&Rule, &Value, &Value) -> Validity` closure.
/// `value` is `null` when the field's location is missing from the tree.
///
/// # Example
///
/// ```rust
/// use formfield::rules::{Rule, Validity};
/// use serde_json::Value;
///
/// let rule = Rule::new().validator(|_rule: &Rule, value: &Value, values: &Value| {
///     if value == &values["source"] {
///         Validity::Fail("destination must differ from source".to_string())
///     } else {
///         Validity::Pass
///     }
/// });
/// ```
pub trait CustomValidator: Send + Sync {
    fn validate(&self, rule: &Rule, value: &Value, values: &Value) -> Validity;
}

impl<F> CustomValidator for F
where
    F: Fn(&Rule, &Value, &Value) -> Validity + Send + Sync,
{
    fn validate(&self, rule: &Rule, value: &Value, values: &Value) -> Validity {
        self(rule, value, values)
    }
}

/// Runs a validator and normalizes every outcome to an optional message.
pub(crate) async fn run_validator(
    validator: Arc<dyn CustomValidator>,
    rule: &Rule,
    value: &Value,
    values: &Value,
) -> Option<String> {
    let answer =
        std::panic::catch_unwind(AssertUnwindSafe(|| validator.validate(rule, value, values)));

    match answer {
        Ok(Validity::Pass) => None,
        Ok(Validity::Fail(message)) => non_empty(message),
        Ok(Validity::Pending(future)) => match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(message)) => message.and_then(non_empty),
            Ok(Err(message)) => {
                Some(non_empty(message).unwrap_or_else(|| "validation failed".to_string()))
            }
            Err(payload) => Some(panic_message(payload)),
        },
        Err(payload) => Some(panic_message(payload)),
    }
}

fn non_empty(message: String) -> Option<String> {
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "validator panicked".to_string()
    };
    tracing::warn!(%message, "custom validator panicked");
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn run<V: CustomValidator + 'static>(validator: V, value: Value) -> Option<String> {
        let rule = Rule::new();
        block_on(run_validator(Arc::new(validator), &rule, &value, &json!({})))
    }

    #[test]
    fn test_sync_outcomes() {
        assert_eq!(run(|_: &Rule, _: &Value, _: &Value| Validity::Pass, json!(1)), None);
        assert_eq!(
            run(
                |_: &Rule, _: &Value, _: &Value| Validity::Fail("taken".into()),
                json!(1)
            ),
            Some("taken".to_string())
        );
        assert_eq!(
            run(
                |_: &Rule, _: &Value, _: &Value| Validity::Fail(String::new()),
                json!(1)
            ),
            None
        );
    }

    #[test]
    fn test_pending_outcomes() {
        let pass = |_: &Rule, _: &Value, _: &Value| Validity::pending(async { Ok(None) });
        assert_eq!(run(pass, json!(1)), None);

        let fail =
            |_: &Rule, _: &Value, _: &Value| Validity::pending(async { Ok(Some("exists".into())) });
        assert_eq!(run(fail, json!(1)), Some("exists".to_string()));

        let reject = |_: &Rule, _: &Value, _: &Value| {
            Validity::pending(async { Err("cluster unreachable".into()) })
        };
        assert_eq!(run(reject, json!(1)), Some("cluster unreachable".to_string()));
    }

    #[test]
    fn test_panics_become_messages() {
        let sync_panic = |_: &Rule, _: &Value, _: &Value| -> Validity { panic!("boom") };
        assert_eq!(run(sync_panic, json!(1)), Some("boom".to_string()));

        let async_panic = |_: &Rule, _: &Value, _: &Value| {
            Validity::pending(async {
                if true {
                    panic!("late boom");
                }
                Ok(None)
            })
        };
        assert_eq!(run(async_panic, json!(1)), Some("late boom".to_string()));
    }

    #[test]
    fn test_validity_conversions() {
        assert!(matches!(Validity::from(None), Validity::Pass));
        assert!(matches!(Validity::from(Some("x".to_string())), Validity::Fail(_)));
        assert!(matches!(Validity::from(Err::<(), _>("x".to_string())), Validity::Fail(_)));
    }
}
