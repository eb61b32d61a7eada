//! Rule-based response validation
//!
//! Pure evaluation of declarative rules against a call outcome. Every rule
//! runs; failures accumulate in rule order.

use regex::Regex;
use serde_json::{Number, Value};

use crate::contracts::{CallOutcome, Rule, ValidationResult};
use crate::error::RuleError;

/// Evaluate `rules` against `outcome`
pub fn evaluate(outcome: &CallOutcome, rules: &[Rule]) -> ValidationResult {
    let failures = rules
        .iter()
        .filter_map(|rule| match check_rule(outcome, rule) {
            Ok(failure) => failure,
            Err(e) => {
                tracing::debug!(rule = %rule, error = %e, "Rule could not be evaluated");
                Some(format!("Validation error for rule {}: {}", rule.kind(), e))
            }
        })
        .collect::<Vec<_>>();

    if !failures.is_empty() {
        tracing::debug!(failures = failures.len(), rules = rules.len(), "Validation failed");
    }

    ValidationResult::from_failures(failures)
}

/// Check one rule; `Ok(Some(msg))` is a failure
fn check_rule(outcome: &CallOutcome, rule: &Rule) -> Result<Option<String>, RuleError> {
    match rule {
        Rule::StatusCode { value } => Ok((outcome.status_code != *value)
            .then(|| format!("Status code {} != {}", outcome.status_code, value))),

        Rule::Contains { value } => {
            let text = stringify(&outcome.body);
            let needle = stringify(value);
            Ok((!text.contains(needle.as_str()))
                .then(|| format!("Response does not contain '{}'", needle)))
        }

        Rule::Regex { pattern } => {
            let re = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            Ok((!re.is_match(&stringify(&outcome.body)))
                .then(|| format!("Response does not match regex '{}'", pattern)))
        }

        Rule::JsonPath { field, value } | Rule::Equals { field, value } => {
            let actual = resolve_path(&outcome.body, field).unwrap_or(&Value::Null);
            Ok((!values_equal(actual, value))
                .then(|| format!("Field '{}' value {} != {}", field, actual, value)))
        }
    }
}

/// Text form of a body: strings verbatim, everything else as compact JSON
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve a dot-separated path through nested mappings
///
/// Returns `None` when a segment is missing or the current value is not a
/// mapping.
pub fn resolve_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(body, |current, segment| current.as_object()?.get(segment))
}

/// Deep equality where integers and floats compare numerically
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map_or(false, |y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (as_integer(a), as_integer(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn outcome(status: u16, body: Value) -> CallOutcome {
        CallOutcome::http(status, BTreeMap::new(), body)
    }

    #[test]
    fn test_no_rules_passes() {
        let result = evaluate(&outcome(500, json!(null)), &[]);
        assert!(result.passed);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_status_code_rule() {
        let rules = [Rule::status_code(200)];
        assert!(evaluate(&outcome(200, json!({})), &rules).passed);

        let result = evaluate(&outcome(404, json!({})), &rules);
        assert!(!result.passed);
        assert_eq!(result.failures, vec!["Status code 404 != 200"]);
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let body = json!("Hello World");
        assert!(evaluate(&outcome(200, body.clone()), &[Rule::contains("World")]).passed);

        let result = evaluate(&outcome(200, body), &[Rule::contains("world")]);
        assert!(!result.passed);
        assert_eq!(result.failures, vec!["Response does not contain 'world'"]);
    }

    #[test]
    fn test_contains_searches_structured_body() {
        let body = json!({"status": "UP", "checks": [{"name": "db"}]});
        assert!(evaluate(&outcome(200, body.clone()), &[Rule::contains("\"db\"")]).passed);
        assert!(evaluate(&outcome(200, body), &[Rule::contains("UP")]).passed);
    }

    #[test]
    fn test_regex_searches_anywhere() {
        let body = json!({"result": "212"});
        assert!(evaluate(&outcome(200, body.clone()), &[Rule::regex(r"\d{3}")]).passed);

        let result = evaluate(&outcome(200, body), &[Rule::regex("^abc$")]);
        assert_eq!(result.failures, vec!["Response does not match regex '^abc$'"]);
    }

    #[test]
    fn test_invalid_regex_becomes_failure_entry() {
        let rules = [Rule::regex("(unclosed"), Rule::status_code(200)];
        let result = evaluate(&outcome(500, json!("x")), &rules);

        assert!(!result.passed);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].starts_with("Validation error for rule regex:"));
        assert_eq!(result.failures[1], "Status code 500 != 200");
    }

    #[test]
    fn test_json_path_round_trip() {
        let body = json!({"a": {"b": 5}});
        assert!(evaluate(&outcome(200, body.clone()), &[Rule::json_path("a.b", 5)]).passed);

        let result = evaluate(&outcome(200, body), &[Rule::json_path("a.b", 6)]);
        assert!(!result.passed);
        assert!(result.failures[0].contains("a.b"));
        assert_eq!(result.failures[0], "Field 'a.b' value 5 != 6");
    }

    #[test]
    fn test_equals_matches_json_path() {
        let body = json!({"result": "32", "meta": {"tags": ["x", "y"]}});
        for rule in [
            Rule::equals("result", "32"),
            Rule::json_path("result", "32"),
            Rule::equals("meta.tags", json!(["x", "y"])),
        ] {
            assert!(evaluate(&outcome(200, body.clone()), &[rule]).passed);
        }
    }

    #[test]
    fn test_path_through_non_mapping_is_not_found() {
        let body = json!({"items": [1, 2], "name": "svc"});
        assert_eq!(resolve_path(&body, "items.0"), None);
        assert_eq!(resolve_path(&body, "name.first"), None);
        assert_eq!(resolve_path(&body, "missing"), None);

        let result = evaluate(&outcome(200, body), &[Rule::json_path("items.0", 1)]);
        assert_eq!(result.failures, vec!["Field 'items.0' value null != 1"]);
    }

    #[test]
    fn test_empty_field_is_not_found() {
        let body = json!({"a": 1});
        assert_eq!(resolve_path(&body, ""), None);

        let result = evaluate(&outcome(200, body.clone()), &[Rule::json_path("", Value::Null)]);
        assert!(result.passed);

        let result = evaluate(&outcome(200, body), &[Rule::equals("", 1)]);
        assert_eq!(result.failures, vec!["Field '' value null != 1"]);
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        assert!(values_equal(&json!(5), &json!(5.0)));
        assert!(values_equal(&json!({"n": [1, 2.0]}), &json!({"n": [1.0, 2]})));
        assert!(!values_equal(&json!(5), &json!("5")));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_failures_follow_rule_order() {
        let rules = [
            Rule::contains("missing"),
            Rule::status_code(201),
            Rule::json_path("x", 1),
        ];
        let result = evaluate(&outcome(200, json!({"x": 2})), &rules);
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures[0].starts_with("Response does not contain"));
        assert!(result.failures[1].starts_with("Status code"));
        assert!(result.failures[2].starts_with("Field 'x'"));
    }

    proptest! {
        #[test]
        fn prop_status_code_rule_matches_equality(actual in 100u16..600, expected in 100u16..600) {
            let result = evaluate(&outcome(actual, json!(null)), &[Rule::status_code(expected)]);
            prop_assert_eq!(result.passed, actual == expected);
        }

        #[test]
        fn prop_order_does_not_change_verdict(status in 100u16..600, text in "[a-z]{0,12}") {
            let rules = vec![
                Rule::status_code(200),
                Rule::contains("abc"),
                Rule::json_path("k", text.clone()),
            ];
            let body = json!({"k": text});
            let forward = evaluate(&outcome(status, body.clone()), &rules);

            let mut reversed_rules = rules.clone();
            reversed_rules.reverse();
            let reversed = evaluate(&outcome(status, body), &reversed_rules);

            prop_assert_eq!(forward.passed, reversed.passed);
            let mut reversed_failures = reversed.failures.clone();
            reversed_failures.reverse();
            prop_assert_eq!(forward.failures, reversed_failures);
        }

        #[test]
        fn prop_evaluation_is_idempotent(status in 100u16..600, needle in "[A-Za-z ]{0,8}") {
            let rules = vec![Rule::contains(needle), Rule::status_code(200)];
            let o = outcome(status, json!("Hello World"));
            prop_assert_eq!(evaluate(&o, &rules), evaluate(&o, &rules));
        }
    }
}
