//! String filter handler.

use serde_json::Value;

use super::{FilterMethod, scalar_text};
use crate::query::{Comparison, SqlParam};

/// Handles string (and uuid) comparisons.
pub struct StringHandler;

impl StringHandler {
    /// Compiles an equality or pattern operator.
    ///
    /// Pattern operators wrap the value in `%` wildcards; the value itself is
    /// not escaped, so `%` and `_` typed by the user keep their LIKE meaning.
    pub fn compile(operator: &str, value: &Value) -> Option<FilterMethod> {
        let text = scalar_text(value)?;
        if text.is_empty() {
            return None;
        }

        let (op, pattern) = match operator {
            "=" => return Some(Self::compare(Comparison::Eq, value)),
            "!=" => return Some(Self::compare(Comparison::Ne, value)),
            "*=*" => (Comparison::Like, format!("%{}%", text)),
            "*!=*" => (Comparison::NotLike, format!("%{}%", text)),
            "=*" => (Comparison::Like, format!("{}%", text)),
            "!=*" => (Comparison::NotLike, format!("{}%", text)),
            "*=" => (Comparison::Like, format!("%{}", text)),
            "*!=" => (Comparison::NotLike, format!("%{}", text)),
            _ => return None,
        };

        Some(FilterMethod::Compare {
            op,
            value: SqlParam::String(pattern),
        })
    }

    fn compare(op: Comparison, value: &Value) -> FilterMethod {
        FilterMethod::Compare {
            op,
            value: SqlParam::from_value(value),
        }
    }
}
