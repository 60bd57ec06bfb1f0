//! Membership filter handler.

use serde_json::Value;

use super::FilterMethod;
use crate::query::SqlParam;

/// Handles `IN` / `NOT_IN`.
pub struct ListHandler;

impl ListHandler {
    /// Compiles a membership test. With `split`, text values are broken on
    /// `;`, `,` and spaces. An empty set drops the filter.
    pub fn compile(operator: &str, value: &Value, split: bool) -> Option<FilterMethod> {
        let values = Self::values(value, split);
        if values.is_empty() {
            return None;
        }

        Some(FilterMethod::In {
            values,
            negated: operator == "NOT_IN",
        })
    }

    /// Collects the membership set from a list or text value.
    pub fn values(value: &Value, split: bool) -> Vec<SqlParam> {
        match value {
            Value::Array(items) => items.iter().filter_map(Self::item).collect(),
            Value::String(text) if split => text
                .replace([',', ' '], ";")
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SqlParam::string)
                .collect(),
            other => Self::item(other).into_iter().collect(),
        }
    }

    fn item(value: &Value) -> Option<SqlParam> {
        match value {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| SqlParam::string(s))
            }
            Value::Number(_) | Value::Bool(_) => Some(SqlParam::from_value(value)),
            _ => None,
        }
    }
}
