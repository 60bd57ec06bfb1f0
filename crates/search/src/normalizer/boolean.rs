//! Boolean filter handler.

use serde_json::Value;

use super::FilterMethod;
use crate::query::{Comparison, SqlParam};

/// Handles true/false flags.
pub struct BooleanHandler;

impl BooleanHandler {
    /// Compiles `=`/`!=` against `1` or `0`. Values that are not recognisably
    /// true or false are dropped.
    pub fn compile(operator: &str, value: &Value) -> Option<FilterMethod> {
        let op = match operator {
            "=" => Comparison::Eq,
            "!=" => Comparison::Ne,
            _ => return None,
        };
        let flag = Self::flag(value)?;

        Some(FilterMethod::Compare {
            op,
            value: SqlParam::Integer(i64::from(flag)),
        })
    }

    /// Reads `true`/`1`/`"1"`/`"true"` and `false`/`0`/`"0"`/`"false"`.
    pub fn flag(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}
