//! The select query the search engine composes onto.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionGroup};
use super::fragment::{SqlFragment, SqlParam, quote_identifier};

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    #[default]
    Left,
}

impl JoinKind {
    fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
        }
    }
}

impl std::str::FromStr for JoinKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            _ => Err(format!("unknown join kind: {}", s)),
        }
    }
}

/// A joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join flavour.
    pub kind: JoinKind,
    /// Table being joined.
    pub table: String,
    /// Alias the table is known by within the query.
    pub alias: Option<String>,
    /// ON conditions.
    pub on: ConditionGroup,
}

impl Join {
    /// Creates a join without conditions.
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            on: ConditionGroup::new(),
        }
    }

    /// Sets the alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an ON condition (AND-combined).
    pub fn on(mut self, condition: Condition) -> Self {
        self.on.and(condition);
        self
    }

    /// Name the joined table is referenced by: its alias, or the table itself.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    fn write(&self, out: &mut SqlFragment) {
        out.push_str(&format!(
            " {} {}",
            self.kind.as_sql(),
            quote_identifier(&self.table)
        ));
        if let Some(alias) = &self.alias {
            out.push_str(&format!(" AS {}", quote_identifier(alias)));
        }
        if !self.on.is_empty() {
            out.push_str(" ON ");
            self.on.write(out);
        }
    }
}

/// A `SELECT` statement under construction.
///
/// Only the parts search composition needs are modelled: projection, joins,
/// a WHERE tree and GROUP BY. Rendering produces `?N` placeholders suitable
/// for SQLite and most drivers that accept numbered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    alias: Option<String>,
    columns: Vec<String>,
    joins: Vec<Join>,
    wheres: ConditionGroup,
    group_by: Vec<String>,
}

impl SelectQuery {
    /// Starts a query over `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            columns: Vec::new(),
            joins: Vec::new(),
            wheres: ConditionGroup::new(),
            group_by: Vec::new(),
        }
    }

    /// Starts a query over `table AS alias`.
    pub fn from_as(table: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut query = Self::new(table);
        query.alias = Some(alias.into());
        query
    }

    /// The base table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Adds a column to the projection (quoted on render).
    pub fn select(&mut self, column: &str) -> &mut Self {
        self.columns.push(quote_identifier(column));
        self
    }

    /// Adds a raw expression to the projection.
    pub fn select_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.columns.push(expression.into());
        self
    }

    /// True once anything has been added to the projection.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Adds a join.
    pub fn join(&mut self, join: Join) -> &mut Self {
        self.joins.push(join);
        self
    }

    /// The joins added so far.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Adds a WHERE condition with AND.
    pub fn and_where(&mut self, condition: Condition) -> &mut Self {
        self.wheres.and(condition);
        self
    }

    /// Adds a WHERE condition with OR.
    pub fn or_where(&mut self, condition: Condition) -> &mut Self {
        self.wheres.or(condition);
        self
    }

    /// Adds a parenthesised WHERE group with AND.
    pub fn where_group(&mut self, group: ConditionGroup) -> &mut Self {
        self.wheres.and(Condition::Group(group));
        self
    }

    /// The WHERE tree.
    pub fn wheres(&self) -> &ConditionGroup {
        &self.wheres
    }

    /// Mutable access to the WHERE tree.
    pub fn where_mut(&mut self) -> &mut ConditionGroup {
        &mut self.wheres
    }

    /// Adds a GROUP BY column.
    pub fn group_by(&mut self, column: &str) -> &mut Self {
        self.group_by.push(quote_identifier(column));
        self
    }

    /// Renders the statement into `out`, continuing its parameter numbering.
    pub fn write(&self, out: &mut SqlFragment) {
        out.push_str("SELECT ");
        if self.columns.is_empty() {
            out.push_str("*");
        } else {
            out.push_str(&self.columns.join(", "));
        }
        out.push_str(" FROM ");
        out.push_str(&quote_identifier(&self.table));
        if let Some(alias) = &self.alias {
            out.push_str(&format!(" AS {}", quote_identifier(alias)));
        }
        for join in &self.joins {
            join.write(out);
        }
        if !self.wheres.is_empty() {
            out.push_str(" WHERE ");
            self.wheres.write(out);
        }
        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&self.group_by.join(", "));
        }
    }

    /// Renders the statement and its bindings.
    pub fn build(&self) -> SqlFragment {
        let mut out = SqlFragment::default();
        self.write(&mut out);
        out
    }

    /// SQL text with `?N` placeholders.
    pub fn to_sql(&self) -> String {
        self.build().sql
    }

    /// Values bound to the placeholders of [`to_sql`](Self::to_sql), in order.
    pub fn bindings(&self) -> Vec<SqlParam> {
        self.build().params
    }

    /// SQL text with the bindings interpolated as literals.
    pub fn to_debug_sql(&self) -> String {
        self.build().interpolated()
    }
}
