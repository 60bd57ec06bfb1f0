//! Engine configuration.
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `path_separator` | `-` | Alternative to `.` between relationship and attribute in field names |
//! | `relation_strategy` | `join` | How relationship filters reach related rows |
//! | `value_combination` | `all` | How several filters on one field combine |
//! | `join_type` | `left` | Join flavour used for relationship joins |
//! | `alias_token_length` | 6 | Length of the random token in join aliases |
//! | `distinct_on_join` | true | Project `DISTINCT key, table.*` when joins are added |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::query::JoinKind;

/// How filters on related entities are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStrategy {
    /// Join each referenced relationship once and filter the joined columns.
    #[default]
    Join,
    /// Wrap each relationship's filters in a correlated `EXISTS` subquery.
    Exists,
}

impl fmt::Display for RelationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationStrategy::Join => write!(f, "join"),
            RelationStrategy::Exists => write!(f, "exists"),
        }
    }
}

impl FromStr for RelationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "join" => Ok(RelationStrategy::Join),
            "exists" => Ok(RelationStrategy::Exists),
            _ => Err(format!("unknown relation strategy: {}", s)),
        }
    }
}

/// How several filters supplied for the same field combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueCombination {
    /// Every filter must match.
    #[default]
    All,
    /// Any positive filter may match; negative filters must all match.
    Any,
}

impl fmt::Display for ValueCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCombination::All => write!(f, "all"),
            ValueCombination::Any => write!(f, "any"),
        }
    }
}

impl FromStr for ValueCombination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ValueCombination::All),
            "any" => Ok(ValueCombination::Any),
            _ => Err(format!("unknown value combination: {}", s)),
        }
    }
}

/// Configuration for a search invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Separator accepted in place of `.` in relationship field names.
    pub path_separator: String,
    /// How relationship filters are applied.
    pub relation_strategy: RelationStrategy,
    /// How several filters on one field combine.
    pub value_combination: ValueCombination,
    /// Join flavour for relationship joins.
    pub join_type: JoinKind,
    /// Number of hex characters in join alias tokens.
    pub alias_token_length: usize,
    /// Project `DISTINCT key, table.*` when joins are added to an unprojected query.
    pub distinct_on_join: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            path_separator: "-".to_string(),
            relation_strategy: RelationStrategy::Join,
            value_combination: ValueCombination::All,
            join_type: JoinKind::Left,
            alias_token_length: 6,
            distinct_on_join: true,
        }
    }
}

/// Longest token a v4 UUID's simple form can supply.
pub const MAX_ALIAS_TOKEN_LENGTH: usize = 32;

impl SearchConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.path_separator.chars().count() > 1 {
            errors.push("Path separator must be a single character".to_string());
        }

        if self
            .path_separator
            .chars()
            .any(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
        {
            errors.push("Path separator cannot be alphanumeric, '_' or whitespace".to_string());
        }

        if self.alias_token_length == 0 {
            errors.push("Alias token length cannot be 0".to_string());
        }

        if self.alias_token_length > MAX_ALIAS_TOKEN_LENGTH {
            errors.push(format!(
                "Alias token length cannot exceed {}",
                MAX_ALIAS_TOKEN_LENGTH
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates, converting failures into a [`ConfigurationError`].
    pub fn check(&self) -> Result<(), ConfigurationError> {
        self.validate().map_err(ConfigurationError::InvalidConfig)
    }

    /// Sets the relation strategy.
    pub fn with_relation_strategy(mut self, strategy: RelationStrategy) -> Self {
        self.relation_strategy = strategy;
        self
    }

    /// Sets how several filters on one field combine.
    pub fn with_value_combination(mut self, combination: ValueCombination) -> Self {
        self.value_combination = combination;
        self
    }

    /// Sets the join flavour.
    pub fn with_join_type(mut self, join_type: JoinKind) -> Self {
        self.join_type = join_type;
        self
    }

    /// Sets the path separator.
    pub fn with_path_separator(mut self, separator: impl Into<String>) -> Self {
        self.path_separator = separator.into();
        self
    }
}
