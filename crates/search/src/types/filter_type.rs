//! Filter types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of filter a searchable attribute accepts.
///
/// Determines the allowed operators and how raw values are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Free text; defaults to "contains".
    #[default]
    #[serde(rename = "string")]
    String,
    /// Numeric comparisons.
    #[serde(rename = "number")]
    Number,
    /// True/false flags.
    #[serde(rename = "boolean")]
    Boolean,
    /// Membership in a caller-supplied set.
    #[serde(rename = "list")]
    List,
    /// Membership in a set resolved through the entity's lookup provider.
    #[serde(rename = "listLookup")]
    ListLookup,
    /// Named predicate supplied by the entity's scope provider.
    #[serde(rename = "scope")]
    Scope,
    /// Identifier equality and membership.
    #[serde(rename = "uuid")]
    Uuid,
    /// Reserved; accepts no operators.
    #[serde(rename = "date")]
    Date,
}

impl FilterType {
    /// All filter types, in catalog order.
    pub const ALL: [FilterType; 8] = [
        FilterType::String,
        FilterType::Number,
        FilterType::Boolean,
        FilterType::List,
        FilterType::ListLookup,
        FilterType::Scope,
        FilterType::Uuid,
        FilterType::Date,
    ];

    /// Infers a filter type from a cast kind.
    ///
    /// Returns `None` for casts that are not searchable (arrays, json, ...).
    pub fn from_cast(cast: &str) -> Option<Self> {
        match cast.to_ascii_lowercase().as_str() {
            "int" | "integer" | "numeric" | "decimal" | "double" | "float" | "real" => {
                Some(FilterType::Number)
            }
            "bool" | "boolean" => Some(FilterType::Boolean),
            "string" | "text" => Some(FilterType::String),
            "uuid" => Some(FilterType::Uuid),
            "date" | "datetime" | "timestamp" | "immutable_date" | "immutable_datetime" => {
                Some(FilterType::Date)
            }
            // decimal:2 and friends carry a precision suffix
            other if other.starts_with("decimal:") => Some(FilterType::Number),
            _ => None,
        }
    }

    /// Operator used when a filter supplies none.
    pub fn default_operator(&self) -> Option<&'static str> {
        match self {
            FilterType::String => Some("*=*"),
            FilterType::Number | FilterType::Boolean => Some("="),
            FilterType::List | FilterType::ListLookup | FilterType::Scope | FilterType::Uuid => {
                Some("IN")
            }
            FilterType::Date => None,
        }
    }

    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::String => "string",
            FilterType::Number => "number",
            FilterType::Boolean => "boolean",
            FilterType::List => "list",
            FilterType::ListLookup => "listLookup",
            FilterType::Scope => "scope",
            FilterType::Uuid => "uuid",
            FilterType::Date => "date",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown filter type: {}", s))
    }
}
