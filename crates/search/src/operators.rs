//! Operator catalog.
//!
//! A static registry of the operators each [`FilterType`] accepts, in display
//! order, with the metadata a search UI needs (display name, inline synonym,
//! helper text). The catalog is built once on first use and read-only after.
//!
//! Operator codes:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `*=*` / `*!=*` | contains / does not contain |
//! | `=*` / `!=*` | begins with / does not begin with |
//! | `*=` / `*!=` | ends with / does not end with |
//! | `=` `!=` `>` `>=` `<=` `<` | comparisons |
//! | `BETWEEN` | inclusive numeric range |
//! | `IN` / `NOT_IN` | membership |
//! | `EMPTY` / `NOT_EMPTY` | equals / differs from the empty string |
//! | `NULL` / `NOT_NULL` | null tests |

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::types::FilterType;

/// An operator accepted by a filter type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    /// The code used in requests.
    pub code: &'static str,
    /// Human readable name.
    pub name: &'static str,
    /// Phrase used when the operator is written inline ("begins with").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<&'static str>,
    /// Entry hint for the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

const fn op(code: &'static str, name: &'static str) -> Operator {
    Operator {
        code,
        name,
        inline: None,
        help: None,
    }
}

const fn inline(code: &'static str, name: &'static str, phrase: &'static str) -> Operator {
    Operator {
        code,
        name,
        inline: Some(phrase),
        help: None,
    }
}

const fn helped(code: &'static str, name: &'static str, help: &'static str) -> Operator {
    Operator {
        code,
        name,
        inline: None,
        help: Some(help),
    }
}

/// Codes that bypass per-type operator handling on every non-boolean type.
pub const SPECIAL_CODES: [&str; 6] = ["NULL", "NOT_NULL", "EMPTY", "NOT_EMPTY", "IN", "NOT_IN"];

/// Values that, given alone, become the operator.
pub const SENTINEL_CODES: [&str; 4] = ["NULL", "NOT_NULL", "EMPTY", "NOT_EMPTY"];

const LIST_HELP: &str = "Separated by semi-colon";

static CATALOG: LazyLock<HashMap<FilterType, Vec<Operator>>> = LazyLock::new(|| {
    let mut catalog = HashMap::new();

    catalog.insert(
        FilterType::String,
        vec![
            inline("*=*", "Contains", "contains"),
            inline("*!=*", "Not contain", "does not contain"),
            inline("=", "Equals", "is"),
            inline("!=", "Not equal", "is not"),
            inline("=*", "Begins with", "begins with"),
            inline("!=*", "Does not begin with", "does not begin with"),
            inline("*=", "Ends with", "ends with"),
            inline("*!=", "Does not end with", "does not end with"),
            helped("IN", "In...", LIST_HELP),
            helped("NOT_IN", "Not in...", LIST_HELP),
            op("EMPTY", "Empty"),
            op("NOT_EMPTY", "Not empty"),
            op("NULL", "NULL"),
            op("NOT_NULL", "Not NULL"),
        ],
    );

    catalog.insert(
        FilterType::Number,
        vec![
            op("=", "Equals"),
            op("!=", "Not equals"),
            op(">", "Greater than"),
            op(">=", "Greater than and equal to"),
            op("<=", "Less than and equal to"),
            op("<", "Less than"),
            helped("BETWEEN", "Between", "Two numbers separated by ><"),
            helped("IN", "In...", LIST_HELP),
            helped("NOT_IN", "Not in...", LIST_HELP),
            op("EMPTY", "Empty"),
            op("NOT_EMPTY", "Not empty"),
            op("NULL", "NULL"),
            op("NOT_NULL", "Not NULL"),
        ],
    );

    catalog.insert(
        FilterType::Boolean,
        vec![
            op("1", "True"),
            op("0", "False"),
            op("=", "Equals"),
            op("!=", "Not equals"),
        ],
    );

    let selected = vec![op("IN", "In selected"), op("NOT_IN", "Not in selected")];
    catalog.insert(FilterType::List, selected.clone());
    catalog.insert(FilterType::ListLookup, selected);

    let identifiers = vec![
        inline("=", "Equals", "is"),
        inline("!=", "Not equals", "is not"),
        inline("IN", "In list", "in"),
        inline("NOT_IN", "Not in list", "not in"),
        inline("NULL", "Is null", "is null"),
        inline("NOT_NULL", "Is not null", "is not null"),
    ];
    catalog.insert(FilterType::Uuid, identifiers.clone());
    catalog.insert(FilterType::Scope, identifiers);

    catalog.insert(FilterType::Date, Vec::new());

    catalog
});

/// Returns the operators a filter type accepts, in display order.
pub fn operators(filter_type: FilterType) -> &'static [Operator] {
    CATALOG
        .get(&filter_type)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Returns the codes a filter type accepts, in display order.
pub fn allowed_operators(filter_type: FilterType) -> Vec<&'static str> {
    operators(filter_type).iter().map(|o| o.code).collect()
}

/// Looks up an operator by code.
///
/// Word codes (`in`, `not_null`) match case-insensitively.
pub fn operator(filter_type: FilterType, code: &str) -> Option<&'static Operator> {
    let ops = operators(filter_type);
    ops.iter()
        .find(|o| o.code == code)
        .or_else(|| ops.iter().find(|o| o.code.eq_ignore_ascii_case(code)))
}

/// True if `code` is an operator of `filter_type`.
pub fn is_valid_operator(filter_type: FilterType, code: &str) -> bool {
    operator(filter_type, code).is_some()
}

/// True unless the operator text contains `!` or `NOT` (any case).
pub fn is_positive(code: &str) -> bool {
    !(code.contains('!') || code.to_ascii_uppercase().contains("NOT"))
}

/// Result of [`parse_inline_operator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineOperator {
    /// Inline phrase of the operator ("contains" when none was written).
    pub name: &'static str,
    /// The operator code, if one was written.
    pub code: Option<&'static str>,
    /// The remaining value text.
    pub value: String,
}

/// Splits free text such as `"=* Smi"` into operator and value, for
/// presenting a typed-in string filter back to a user.
pub fn parse_inline_operator(text: &str) -> InlineOperator {
    let trimmed = text.trim();
    if let Some((head, rest)) = trimmed.split_once(' ') {
        if let Some(found) = operator(FilterType::String, head) {
            return InlineOperator {
                name: found.inline.unwrap_or("contains"),
                code: Some(found.code),
                value: rest.trim().to_string(),
            };
        }
    }

    InlineOperator {
        name: "contains",
        code: None,
        value: text.to_string(),
    }
}
