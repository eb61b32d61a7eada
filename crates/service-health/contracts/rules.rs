//! Declarative validation rules
//!
//! Rules are tagged on `type` so the wire format stays
//! `{"type": "json_path", "field": "a.b", "value": 5}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One assertion checked against a call outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Exact match on the response status code
    StatusCode { value: u16 },

    /// Case-sensitive substring match on the stringified body
    Contains { value: Value },

    /// Regex search anywhere in the stringified body
    Regex { pattern: String },

    /// Deep equality of the value at a dot-separated path
    JsonPath {
        field: String,
        #[serde(default)]
        value: Value,
    },

    /// Same resolution and comparison as `JsonPath`
    Equals {
        field: String,
        #[serde(default)]
        value: Value,
    },
}

impl Rule {
    pub fn status_code(value: u16) -> Self {
        Rule::StatusCode { value }
    }

    pub fn contains(value: impl Into<Value>) -> Self {
        Rule::Contains {
            value: value.into(),
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Rule::Regex {
            pattern: pattern.into(),
        }
    }

    pub fn json_path(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Rule::JsonPath {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Rule::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wire name of the rule kind
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::StatusCode { .. } => "status_code",
            Rule::Contains { .. } => "contains",
            Rule::Regex { .. } => "regex",
            Rule::JsonPath { .. } => "json_path",
            Rule::Equals { .. } => "equals",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::StatusCode { value } => write!(f, "status_code == {}", value),
            Rule::Contains { value } => write!(f, "contains {}", value),
            Rule::Regex { pattern } => write!(f, "regex /{}/", pattern),
            Rule::JsonPath { field, value } | Rule::Equals { field, value } => {
                write!(f, "{} {} == {}", self.kind(), field, value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_wire_format() {
        let rules: Vec<Rule> = serde_json::from_value(json!([
            {"type": "status_code", "value": 200},
            {"type": "contains", "value": "OK"},
            {"type": "regex", "pattern": "\\d+"},
            {"type": "json_path", "field": "a.b", "value": 5},
            {"type": "equals", "field": "result"}
        ]))
        .unwrap();

        assert_eq!(rules[0], Rule::status_code(200));
        assert_eq!(rules[1], Rule::contains("OK"));
        assert_eq!(rules[2], Rule::regex("\\d+"));
        assert_eq!(rules[3], Rule::json_path("a.b", 5));
        assert_eq!(rules[4], Rule::equals("result", Value::Null));
    }

    #[test]
    fn test_rule_kind_names() {
        assert_eq!(Rule::status_code(200).kind(), "status_code");
        assert_eq!(Rule::equals("x", 1).kind(), "equals");
        assert_eq!(
            serde_json::to_value(Rule::regex("a+")).unwrap(),
            json!({"type": "regex", "pattern": "a+"})
        );
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(Rule::status_code(200).to_string(), "status_code == 200");
        assert_eq!(Rule::regex("a+").to_string(), "regex /a+/");
        assert_eq!(Rule::json_path("a.b", "UP").to_string(), "json_path a.b == \"UP\"");
    }
}
