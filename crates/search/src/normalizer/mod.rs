//! Filter normalization.
//!
//! Turns the raw filter expressions supplied for one field into
//! [`NormalizedFilter`]s. A raw expression is a scalar, a list of scalars, or
//! a list of `[operator, value, value2?]` tuples. Each filter passes through
//! these steps in order:
//!
//! 1. shape: a scalar becomes `["", value]`; a one-element tuple on a
//!    non-boolean field gets an empty operator
//! 2. wild-all: the value's characters are joined with `%` and the operator
//!    becomes contains / does-not-contain
//! 3. number fields: `low><high` becomes `BETWEEN`
//! 4. without an operator, a leading operator code in the value is adopted
//!    (`"=* Smi"`)
//! 5. a value of exactly `NULL`, `NOT_NULL`, `EMPTY` or `NOT_EMPTY` becomes the
//!    operator
//! 6. the filter type's default operator fills any remaining gap
//! 7. the filter type's handler compiles operator and value into a
//!    [`FilterMethod`]
//!
//! Filters that cannot be compiled are dropped. Only a missing list lookup is
//! an error.

mod boolean;
mod list;
mod lookup;
mod number;
mod presence;
mod scope;
mod string;

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

pub use boolean::BooleanHandler;
pub use list::ListHandler;
pub use lookup::ListLookupHandler;
pub use number::NumberHandler;
pub use presence::{EMPTY_TEMPLATE, NOT_EMPTY_TEMPLATE, PresenceHandler};
pub use scope::ScopeHandler;
pub use string::StringHandler;

use crate::error::SearchResult;
use crate::operators::{self, SENTINEL_CODES, SPECIAL_CODES};
use crate::query::{Comparison, SqlParam};
use crate::resolver::AttributeDescriptor;
use crate::types::FilterType;

static BETWEEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+)\s*><\s*(-?\d+)\s*$").expect("BETWEEN pattern is valid")
});

/// One raw filter: `[operator, value, value2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFilter {
    /// Operator text as supplied; may be empty.
    pub operator: String,
    /// First value.
    pub value: Value,
    /// Second value, for ranges.
    pub value_two: Option<Value>,
}

impl RawFilter {
    /// A filter with no operator.
    pub fn value(value: Value) -> Self {
        Self {
            operator: String::new(),
            value,
            value_two: None,
        }
    }

    /// Splits a field's raw expression into individual filters.
    pub fn split(raw: &Value, filter_type: FilterType) -> Vec<RawFilter> {
        let entries: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Array(parts) => Self::from_parts(parts, filter_type),
                scalar => Some(Self::value(scalar.clone())),
            })
            .collect()
    }

    fn from_parts(parts: &[Value], filter_type: FilterType) -> Option<Self> {
        match parts {
            [] => None,
            [only] if filter_type != FilterType::Boolean => Some(Self::value(only.clone())),
            // A lone boolean element is the value unless it is an operator code
            [only] => Some(match only.as_str() {
                Some(code) if code == "=" || code == "!=" => Self {
                    operator: code.to_string(),
                    value: Value::Null,
                    value_two: None,
                },
                _ => Self::value(only.clone()),
            }),
            [operator, rest @ ..] => Some(Self {
                operator: operator_text(operator),
                value: rest.first().cloned().unwrap_or(Value::Null),
                value_two: rest.get(1).cloned(),
            }),
        }
    }
}

fn operator_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// The comparison a normalized filter performs, with its bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterMethod {
    /// `column op value`; LIKE patterns carry their wildcards.
    Compare {
        /// Comparison operator.
        op: Comparison,
        /// Bound value.
        value: SqlParam,
    },
    /// `column [NOT] IN (values)`
    In {
        /// Membership set.
        values: Vec<SqlParam>,
        /// `NOT IN` when true.
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null {
        /// `IS NOT NULL` when true.
        negated: bool,
    },
    /// `column BETWEEN low AND high`
    Between {
        /// Lower bound.
        low: SqlParam,
        /// Upper bound.
        high: SqlParam,
    },
    /// Raw SQL template; `{column}` is replaced with the quoted column.
    Raw {
        /// The template.
        template: &'static str,
    },
    /// A named scope of the owning entity.
    Scope {
        /// Scope name.
        source: String,
        /// Value handed to the scope.
        value: Value,
    },
}

/// A validated filter ready for compilation.
#[derive(Clone)]
pub struct NormalizedFilter {
    /// Final operator code.
    pub operator: String,
    /// False when the operator negates (`!`, `NOT`).
    pub positive: bool,
    /// Compiled comparison.
    pub method: FilterMethod,
    /// The attribute filtered on.
    pub attribute: Arc<AttributeDescriptor>,
}

impl fmt::Debug for NormalizedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedFilter")
            .field("operator", &self.operator)
            .field("positive", &self.positive)
            .field("method", &self.method)
            .field("attribute", &self.attribute.name)
            .finish()
    }
}

/// Normalizes every filter supplied for a field, dropping the ones that fail.
pub fn normalize_field(
    raw: &Value,
    attribute: &Arc<AttributeDescriptor>,
) -> SearchResult<Vec<NormalizedFilter>> {
    let mut filters = Vec::new();
    for filter in RawFilter::split(raw, attribute.filter_type) {
        if let Some(normalized) = normalize(filter, attribute)? {
            filters.push(normalized);
        }
    }
    Ok(filters)
}

/// Normalizes one filter. `Ok(None)` means the filter was dropped.
pub fn normalize(
    raw: RawFilter,
    attribute: &Arc<AttributeDescriptor>,
) -> SearchResult<Option<NormalizedFilter>> {
    let filter_type = attribute.filter_type;
    let Some(default_operator) = filter_type.default_operator() else {
        debug!(field = %attribute.name, filter = %filter_type, "Dropping filter on reserved type");
        return Ok(None);
    };

    let RawFilter {
        mut operator,
        mut value,
        value_two,
    } = raw;
    let mut bounds = None;

    if attribute.wild_all && filter_type != FilterType::Boolean {
        if let Some(text) = scalar_text(&value) {
            operator = if operators::is_positive(&operator) {
                "*=*"
            } else {
                "*!=*"
            }
            .to_string();
            value = Value::String(wild_all_pattern(&text));
        }
    }

    if filter_type == FilterType::Number
        && (operator.is_empty() || operator.eq_ignore_ascii_case("BETWEEN"))
    {
        if let Some(range) = value.as_str().and_then(parse_between) {
            operator = "BETWEEN".to_string();
            bounds = Some(range);
        }
    }

    if operator.is_empty() && filter_type != FilterType::Boolean {
        let inline = value.as_str().and_then(|text| {
            let (head, rest) = text.trim().split_once(' ')?;
            accepted_operator(filter_type, head).map(|code| (code, rest.trim().to_string()))
        });
        if let Some((code, rest)) = inline {
            trace!(field = %attribute.name, operator = %code, "Inline operator");
            operator = code.to_string();
            value = Value::String(rest);
        }
    }

    // Scopes receive their value unchanged
    if !matches!(filter_type, FilterType::Boolean | FilterType::Scope) {
        let sentinel = value
            .as_str()
            .and_then(|text| SENTINEL_CODES.iter().find(|code| **code == text.trim()));
        if let Some(code) = sentinel {
            operator = code.to_string();
            value = Value::String(String::new());
        }
    }

    if operator.is_empty() {
        operator = default_operator.to_string();
    }

    let Some(mut code) = accepted_operator(filter_type, &operator) else {
        debug!(
            field = %attribute.name,
            filter = %filter_type,
            operator = %operator,
            "Dropping filter with unsupported operator"
        );
        return Ok(None);
    };

    if filter_type == FilterType::Boolean && (code == "1" || code == "0") {
        value = Value::String(code.to_string());
        code = "=";
    }

    let method = match (filter_type, code) {
        (FilterType::Boolean, _) => BooleanHandler::compile(code, &value),
        (FilterType::Scope, _) => ScopeHandler::compile(attribute, &value),
        (_, "NULL" | "NOT_NULL" | "EMPTY" | "NOT_EMPTY") => PresenceHandler::compile(code),
        (FilterType::ListLookup, _) => ListLookupHandler::compile(attribute, &value)?,
        (FilterType::List, "IN" | "NOT_IN") => ListHandler::compile(code, &value, false),
        (_, "IN" | "NOT_IN") => ListHandler::compile(code, &value, true),
        (FilterType::String | FilterType::Uuid, _) => StringHandler::compile(code, &value),
        (FilterType::Number, _) => {
            NumberHandler::compile(code, &value, value_two.as_ref(), bounds)
        }
        (FilterType::List | FilterType::Date, _) => None,
    };

    let Some(method) = method else {
        debug!(
            field = %attribute.name,
            filter = %filter_type,
            operator = %code,
            "Dropping filter whose value cannot be used"
        );
        return Ok(None);
    };

    let operator = match (filter_type, &method) {
        (FilterType::ListLookup, FilterMethod::In { .. }) => "IN",
        _ => code,
    };

    Ok(Some(NormalizedFilter {
        operator: operator.to_string(),
        positive: operators::is_positive(operator),
        method,
        attribute: attribute.clone(),
    }))
}

/// The catalog code for `code`, or a special code every non-boolean type accepts.
fn accepted_operator(filter_type: FilterType, code: &str) -> Option<&'static str> {
    operators::operator(filter_type, code)
        .map(|op| op.code)
        .or_else(|| {
            if filter_type == FilterType::Boolean {
                return None;
            }
            SPECIAL_CODES
                .iter()
                .find(|special| special.eq_ignore_ascii_case(code))
                .copied()
        })
}

fn parse_between(text: &str) -> Option<(SqlParam, SqlParam)> {
    let caps = BETWEEN_PATTERN.captures(text)?;
    let low = caps[1].parse::<i64>().ok()?;
    let high = caps[2].parse::<i64>().ok()?;
    Some((SqlParam::Integer(low), SqlParam::Integer(high)))
}

/// `"12 3"` → `"1%2%3"`
fn wild_all_pattern(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(String::from)
        .collect::<Vec<_>>()
        .join("%")
}

/// Text of a string or number value.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// True for null, blank strings and empty lists.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Runs the owning entity's value transform for `source`, if it has one.
pub(crate) fn transform_value(attribute: &AttributeDescriptor, source: &str, value: &Value) -> Value {
    attribute
        .entity
        .value_transformer()
        .and_then(|transformer| transformer.transform(source, value))
        .unwrap_or_else(|| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SearchEntity;
    use crate::query::ColumnRef;
    use crate::resolver::Owner;
    use serde_json::json;

    struct Table;

    impl SearchEntity for Table {
        fn table(&self) -> &str {
            "t"
        }

        fn cast_fields(&self) -> Vec<(String, String)> {
            Vec::new()
        }
    }

    pub(crate) fn attribute(filter_type: FilterType, wild_all: bool) -> Arc<AttributeDescriptor> {
        Arc::new(AttributeDescriptor {
            name: "f".to_string(),
            title: "F".to_string(),
            filter_type,
            columns: vec![ColumnRef::named("t.f")],
            owner: Owner::Entity,
            source: Some("f".to_string()),
            wild_all,
            source_model: None,
            entity: Arc::new(Table),
        })
    }

    fn one(raw: Value, filter_type: FilterType) -> Option<NormalizedFilter> {
        let attr = attribute(filter_type, false);
        let mut filters = normalize_field(&raw, &attr).unwrap();
        assert!(filters.len() <= 1);
        filters.pop()
    }

    fn like(pattern: &str, negated: bool) -> FilterMethod {
        FilterMethod::Compare {
            op: if negated {
                Comparison::NotLike
            } else {
                Comparison::Like
            },
            value: SqlParam::string(pattern),
        }
    }

    // ========================================================================
    // Shape
    // ========================================================================

    #[test]
    fn test_split_shapes() {
        let filters = RawFilter::split(&json!("x"), FilterType::String);
        assert_eq!(filters, vec![RawFilter::value(json!("x"))]);

        let filters = RawFilter::split(&json!(["a", ["b"], ["=", "c"], []]), FilterType::String);
        assert_eq!(filters.len(), 3);
        assert_eq!(filters[1], RawFilter::value(json!("b")));
        assert_eq!(filters[2].operator, "=");
        assert_eq!(filters[2].value, json!("c"));

        let filters = RawFilter::split(&json!([["BETWEEN", 1, 5]]), FilterType::Number);
        assert_eq!(filters[0].value_two, Some(json!(5)));
    }

    #[test]
    fn test_null_scalar_and_list_agree() {
        let scalar = one(json!("NULL"), FilterType::String).unwrap();
        let listed = one(json!(["NULL"]), FilterType::String).unwrap();
        assert_eq!(scalar.method, FilterMethod::Null { negated: false });
        assert_eq!(scalar.method, listed.method);
        assert_eq!(scalar.operator, "NULL");
    }

    // ========================================================================
    // Operator resolution
    // ========================================================================

    #[test]
    fn test_string_default_contains() {
        let filter = one(json!("Test1"), FilterType::String).unwrap();
        assert_eq!(filter.operator, "*=*");
        assert!(filter.positive);
        assert_eq!(filter.method, like("%Test1%", false));
    }

    #[test]
    fn test_inline_operator() {
        let filter = one(json!("= Test"), FilterType::String).unwrap();
        assert_eq!(filter.operator, "=");
        assert_eq!(
            filter.method,
            FilterMethod::Compare {
                op: Comparison::Eq,
                value: SqlParam::string("Test")
            }
        );

        // Not an operator: the whole text is the value
        let filter = one(json!("hello world"), FilterType::String).unwrap();
        assert_eq!(filter.method, like("%hello world%", false));
    }

    #[test]
    fn test_inline_only_without_explicit_operator() {
        let filter = one(json!([["=", "!= x"]]), FilterType::String).unwrap();
        assert_eq!(filter.operator, "=");
        assert_eq!(
            filter.method,
            FilterMethod::Compare {
                op: Comparison::Eq,
                value: SqlParam::string("!= x")
            }
        );
    }

    #[test]
    fn test_negation_detection() {
        let filter = one(json!([["*!=*", "x"]]), FilterType::String).unwrap();
        assert!(!filter.positive);
        assert_eq!(filter.method, like("%x%", true));

        let filter = one(json!([["not_in", "a;b"]]), FilterType::String).unwrap();
        assert_eq!(filter.operator, "NOT_IN");
        assert!(!filter.positive);
    }

    #[test]
    fn test_unsupported_operator_dropped() {
        assert!(one(json!([[">", "x"]]), FilterType::String).is_none());
        assert!(one(json!([["*=*", 5]]), FilterType::Number).is_none());
    }

    #[test]
    fn test_wild_all() {
        let attr = attribute(FilterType::String, true);
        let filters = normalize_field(&json!("1234 56 789"), &attr).unwrap();
        assert_eq!(filters[0].operator, "*=*");
        assert_eq!(filters[0].method, like("%1%2%3%4%5%6%7%8%9%", false));

        let filters = normalize_field(&json!([["!=", "12"]]), &attr).unwrap();
        assert_eq!(filters[0].operator, "*!=*");
        assert_eq!(filters[0].method, like("%1%2%", true));

        let filters = normalize_field(&json!([["=", "12"]]), &attr).unwrap();
        assert_eq!(filters[0].operator, "*=*");
    }

    // ========================================================================
    // Number
    // ========================================================================

    #[test]
    fn test_between_shorthand() {
        let filter = one(json!("10><20"), FilterType::Number).unwrap();
        assert_eq!(filter.operator, "BETWEEN");
        assert_eq!(
            filter.method,
            FilterMethod::Between {
                low: SqlParam::Integer(10),
                high: SqlParam::Integer(20)
            }
        );

        let filter = one(json!(" -5 >< 5 "), FilterType::Number).unwrap();
        assert_eq!(
            filter.method,
            FilterMethod::Between {
                low: SqlParam::Integer(-5),
                high: SqlParam::Integer(5)
            }
        );
    }

    #[test]
    fn test_between_shorthand_only_for_numbers() {
        let filter = one(json!("10><20"), FilterType::String).unwrap();
        assert_eq!(filter.method, like("%10><20%", false));
    }

    #[test]
    fn test_number_inline_comparison() {
        let filter = one(json!(">= 18"), FilterType::Number).unwrap();
        assert_eq!(filter.operator, ">=");
        assert_eq!(
            filter.method,
            FilterMethod::Compare {
                op: Comparison::Ge,
                value: SqlParam::string("18")
            }
        );
    }

    #[test]
    fn test_number_membership() {
        let filter = one(json!([["IN", [1, 2]]]), FilterType::Number).unwrap();
        assert_eq!(
            filter.method,
            FilterMethod::In {
                values: vec![SqlParam::Integer(1), SqlParam::Integer(2)],
                negated: false
            }
        );
    }

    // ========================================================================
    // Boolean
    // ========================================================================

    #[test]
    fn test_boolean_values() {
        for raw in [json!(true), json!(1), json!("1"), json!([["=", true]]), json!([["1"]])] {
            let filter = one(raw.clone(), FilterType::Boolean).unwrap_or_else(|| panic!("{raw}"));
            assert_eq!(
                filter.method,
                FilterMethod::Compare {
                    op: Comparison::Eq,
                    value: SqlParam::Integer(1)
                },
                "{raw}"
            );
        }
        for raw in [json!(false), json!(0), json!("0")] {
            let filter = one(raw, FilterType::Boolean).unwrap();
            assert_eq!(
                filter.method,
                FilterMethod::Compare {
                    op: Comparison::Eq,
                    value: SqlParam::Integer(0)
                }
            );
        }
    }

    #[test]
    fn test_boolean_skips_inline_and_sentinels() {
        assert!(one(json!("= 1"), FilterType::Boolean).is_none());
        assert!(one(json!("NULL"), FilterType::Boolean).is_none());
        assert!(one(json!("maybe"), FilterType::Boolean).is_none());
    }

    #[test]
    fn test_boolean_not_equal() {
        let filter = one(json!([["!=", false]]), FilterType::Boolean).unwrap();
        assert!(!filter.positive);
        assert_eq!(
            filter.method,
            FilterMethod::Compare {
                op: Comparison::Ne,
                value: SqlParam::Integer(0)
            }
        );
    }

    // ========================================================================
    // Lists and reserved types
    // ========================================================================

    #[test]
    fn test_list_uses_value_directly() {
        let filter = one(json!([["IN", ["a b", "c"]]]), FilterType::List).unwrap();
        assert_eq!(
            filter.method,
            FilterMethod::In {
                values: vec![SqlParam::string("a b"), SqlParam::string("c")],
                negated: false
            }
        );

        // Default operator for lists is IN
        let filter = one(json!("x"), FilterType::List).unwrap();
        assert_eq!(filter.operator, "IN");
    }

    #[test]
    fn test_uuid_equality() {
        let filter = one(json!("= 7f9c"), FilterType::Uuid).unwrap();
        assert_eq!(
            filter.method,
            FilterMethod::Compare {
                op: Comparison::Eq,
                value: SqlParam::string("7f9c")
            }
        );
        assert!(one(json!([["*=*", "7f"]]), FilterType::Uuid).is_none());
    }

    #[test]
    fn test_date_reserved() {
        assert!(one(json!("2024-01-01"), FilterType::Date).is_none());
    }

    #[test]
    fn test_wild_all_pattern() {
        assert_eq!(wild_all_pattern("ab c"), "a%b%c");
        assert_eq!(wild_all_pattern(""), "");
    }
}
