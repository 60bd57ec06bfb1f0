//! Null and empty-string tests.

use super::FilterMethod;

/// Raw template for `EMPTY`.
pub const EMPTY_TEMPLATE: &str = "{column} = ''";

/// Raw template for `NOT_EMPTY`.
pub const NOT_EMPTY_TEMPLATE: &str = "{column} != ''";

/// Handles `NULL`, `NOT_NULL`, `EMPTY` and `NOT_EMPTY`.
pub struct PresenceHandler;

impl PresenceHandler {
    /// Compiles a presence test; these operators take no value.
    pub fn compile(operator: &str) -> Option<FilterMethod> {
        match operator {
            "NULL" => Some(FilterMethod::Null { negated: false }),
            "NOT_NULL" => Some(FilterMethod::Null { negated: true }),
            "EMPTY" => Some(FilterMethod::Raw {
                template: EMPTY_TEMPLATE,
            }),
            "NOT_EMPTY" => Some(FilterMethod::Raw {
                template: NOT_EMPTY_TEMPLATE,
            }),
            _ => None,
        }
    }
}
