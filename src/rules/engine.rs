//! Rule evaluation for a single field.

use futures::future::join_all;
use serde_json::Value;
use stillwater::prelude::*;
use stillwater::Validation;

use super::custom::run_validator;
use super::{builtin, Rule};
use crate::error::{FieldError, FieldErrors};
use crate::path::FieldName;

/// Evaluates one rule: built-in checks first, then the custom validator.
///
/// Returns the rule's first failure, or `None` when it passes.
pub async fn validate_rule(
    name: &FieldName,
    rule: &Rule,
    value: Option<&Value>,
    values: &Value,
) -> Option<FieldError> {
    if let Some(error) = builtin::check(name, rule, value) {
        return Some(error);
    }

    let validator = rule.validator.clone()?;
    let value = value.cloned().unwrap_or(Value::Null);
    run_validator(validator, rule, &value, values)
        .await
        .map(|message| FieldError::new(name.clone(), message).with_code("validator"))
}

/// Evaluates every rule of a field concurrently and accumulates all failures.
///
/// Failures are reported in rule order regardless of which rule resolved
/// first.
///
/// # Example
///
/// ```rust
/// use formfield::rules::{validate_rules, Rule};
/// use formfield::FieldName;
/// use futures::executor::block_on;
/// use serde_json::json;
///
/// let rules = vec![
///     Rule::new().min_length(5),
///     Rule::new().pattern("^[0-9]+$").unwrap(),
/// ];
/// let name = FieldName::from("code");
/// let result = block_on(validate_rules(&name, &rules, Some(&json!("ab")), &json!({})));
/// assert_eq!(result.into_result().unwrap_err().len(), 2);
/// ```
pub async fn validate_rules(
    name: &FieldName,
    rules: &[Rule],
    value: Option<&Value>,
    values: &Value,
) -> Validation<(), FieldErrors> {
    let outcomes = join_all(
        rules
            .iter()
            .map(|rule| validate_rule(name, rule, value, values)),
    )
    .await;

    outcomes
        .into_iter()
        .flatten()
        .fold(Validation::Success(()), |acc, error| {
            let error = FieldErrors::single(error);
            match acc {
                Validation::Success(()) => Validation::Failure(error),
                Validation::Failure(errors) => Validation::Failure(errors.combine(error)),
            }
        })
}

/// Flattens a rule-set result into the message list stored for a field.
pub fn messages(result: Validation<(), FieldErrors>) -> Vec<String> {
    match result {
        Validation::Success(()) => Vec::new(),
        Validation::Failure(errors) => errors.messages(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Validity;
    use futures::executor::block_on;
    use serde_json::json;

    fn name() -> FieldName {
        FieldName::from("alias")
    }

    #[test]
    fn test_all_rules_reported() {
        let rules = vec![
            Rule::new().required().message("Required"),
            Rule::new().min_length(3),
            Rule::new().pattern("^[a-z]+$").unwrap(),
        ];
        let result = block_on(validate_rules(&name(), &rules, Some(&json!("A")), &json!({})));
        let errors = result.into_result().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.with_code("min_length").len(), 1);
        assert_eq!(errors.with_code("pattern").len(), 1);
    }

    #[test]
    fn test_one_message_per_rule() {
        // Both checks fail but they live in one rule, so only the first counts.
        let rules = vec![Rule::new().min_length(5).pattern("^[0-9]+$").unwrap()];
        let result = block_on(validate_rules(&name(), &rules, Some(&json!("ab")), &json!({})));
        assert_eq!(messages(result), vec!["alias must be at least 5 characters"]);
    }

    #[test]
    fn test_validator_runs_after_builtins_pass() {
        let rule = Rule::new()
            .required()
            .validator(|_: &Rule, value: &Value, values: &Value| {
                if value == &values["existing"] {
                    Validity::Fail("alias already exists".into())
                } else {
                    Validity::Pass
                }
            });

        let values = json!({"existing": "logs"});
        let result = block_on(validate_rules(&name(), &[rule.clone()], Some(&json!("logs")), &values));
        assert_eq!(messages(result), vec!["alias already exists"]);

        let result = block_on(validate_rules(&name(), &[rule], None, &values));
        assert_eq!(messages(result), vec!["alias is required"]);
    }

    #[test]
    fn test_validator_sees_null_for_missing_value() {
        let rule = Rule::new().validator(|_: &Rule, value: &Value, _: &Value| {
            if value.is_null() {
                Validity::Fail("missing".into())
            } else {
                Validity::Pass
            }
        });
        let result = block_on(validate_rules(&name(), &[rule], None, &json!({})));
        assert_eq!(messages(result), vec!["missing"]);
    }

    #[test]
    fn test_empty_rule_set_passes() {
        let result = block_on(validate_rules(&name(), &[], None, &json!({})));
        assert!(result.is_success());
    }
}
