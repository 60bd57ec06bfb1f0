//! Number filter handler.

use serde_json::Value;

use super::{FilterMethod, is_blank};
use crate::query::{Comparison, SqlParam};

/// Handles numeric comparisons and ranges.
pub struct NumberHandler;

impl NumberHandler {
    /// Compiles a comparison or `BETWEEN`.
    ///
    /// Range bounds come from the `low><high` shorthand when it matched,
    /// otherwise from the second tuple value or a two-element list.
    pub fn compile(
        operator: &str,
        value: &Value,
        value_two: Option<&Value>,
        bounds: Option<(SqlParam, SqlParam)>,
    ) -> Option<FilterMethod> {
        if operator == "BETWEEN" {
            let (low, high) = bounds.or_else(|| Self::explicit_bounds(value, value_two))?;
            return Some(FilterMethod::Between { low, high });
        }

        let op = Comparison::from_code(operator)?;
        if is_blank(value) || value.is_array() || value.is_object() {
            return None;
        }

        Some(FilterMethod::Compare {
            op,
            value: SqlParam::from_value(value),
        })
    }

    fn explicit_bounds(value: &Value, value_two: Option<&Value>) -> Option<(SqlParam, SqlParam)> {
        let (low, high) = match (value, value_two) {
            (Value::Array(pair), _) if pair.len() == 2 => (&pair[0], &pair[1]),
            (low, Some(high)) => (low, high),
            _ => return None,
        };
        if !Self::is_bound(low) || !Self::is_bound(high) {
            return None;
        }
        Some((SqlParam::from_value(low), SqlParam::from_value(high)))
    }

    fn is_bound(value: &Value) -> bool {
        match value {
            Value::Number(_) => true,
            Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }
    }
}
