//! WHERE-clause trees.
//!
//! A [`ConditionGroup`] is an ordered list of conditions, each joined to the
//! previous one with AND or OR. Nested groups render parenthesised, so the
//! compiler can express `(a LIKE ?1 OR b LIKE ?2) AND (c = ?3)` without any
//! precedence surprises.

// Variant fields are plain SQL operands
#![allow(missing_docs)]

use regex::{Captures, Regex};

use super::builder::SelectQuery;
use super::fragment::{SqlFragment, SqlParam, quote_identifier};

/// A column operand: a (possibly qualified) identifier or a raw SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    /// Identifier such as `orders.total`, quoted on render.
    Named(String),
    /// Raw SQL expression, rendered verbatim.
    Raw(String),
}

impl ColumnRef {
    /// Creates a named column reference.
    pub fn named(name: impl Into<String>) -> Self {
        ColumnRef::Named(name.into())
    }

    /// Creates a raw expression reference.
    pub fn raw(expression: impl Into<String>) -> Self {
        ColumnRef::Raw(expression.into())
    }

    /// Renders the operand as SQL.
    pub fn to_sql(&self) -> String {
        match self {
            ColumnRef::Named(name) => quote_identifier(name),
            ColumnRef::Raw(expression) => expression.clone(),
        }
    }

    /// Returns the table qualifier of a named column, if it has one.
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            ColumnRef::Named(name) => name.rsplit_once('.').map(|(table, _)| table),
            ColumnRef::Raw(_) => None,
        }
    }

    /// Replaces the table qualifier `from` with `to`, inside raw expressions too.
    pub fn requalify(&mut self, from: &str, to: &str) {
        match self {
            ColumnRef::Named(name) => {
                if let Some((table, column)) = name.rsplit_once('.') {
                    if table.replace('"', "") == from {
                        *name = format!("{}.{}", to, column);
                    }
                }
            }
            ColumnRef::Raw(expression) => {
                *expression = requalify_expression(expression, from, to);
            }
        }
    }
}

/// Rewrites `from.` and `"from".` qualifiers in a SQL expression to `to.`.
///
/// Only whole identifiers match: `xfrom.a` and `schema.from.a` are untouched.
fn requalify_expression(sql: &str, from: &str, to: &str) -> String {
    if from.is_empty() || !sql.contains(from) {
        return sql.to_string();
    }
    let escaped = regex::escape(from);
    let pattern = format!(r#"(^|[^\w."])(?:"{0}"|{0})\."#, escaped);
    match Regex::new(&pattern) {
        Ok(qualifier) => qualifier
            .replace_all(sql, |caps: &Captures<'_>| format!("{}{}.", &caps[1], to))
            .into_owned(),
        Err(_) => sql.to_string(),
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
}

impl Comparison {
    /// Returns the SQL operator text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Like => "LIKE",
            Comparison::NotLike => "NOT LIKE",
        }
    }

    /// Maps a filter operator code onto a plain comparison.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "=" => Some(Comparison::Eq),
            "!=" | "<>" => Some(Comparison::Ne),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Ge),
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Le),
            _ => None,
        }
    }
}

/// A single WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column op ?`
    Compare {
        column: ColumnRef,
        op: Comparison,
        value: SqlParam,
    },
    /// `column [NOT] IN (?, ...)`
    In {
        column: ColumnRef,
        values: Vec<SqlParam>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: ColumnRef, negated: bool },
    /// `column BETWEEN ? AND ?`
    Between {
        column: ColumnRef,
        low: SqlParam,
        high: SqlParam,
    },
    /// `left op right`, comparing two columns.
    Columns {
        left: ColumnRef,
        op: Comparison,
        right: ColumnRef,
    },
    /// Raw SQL with bare `?` placeholders.
    Raw { sql: String, params: Vec<SqlParam> },
    /// Parenthesised sub-group.
    Group(ConditionGroup),
    /// `[NOT] EXISTS (subquery)`
    Exists {
        query: Box<SelectQuery>,
        negated: bool,
    },
}

impl Condition {
    /// `column = value`
    pub fn eq(column: ColumnRef, value: SqlParam) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    /// `column op value`
    pub fn compare(column: ColumnRef, op: Comparison, value: SqlParam) -> Self {
        Condition::Compare { column, op, value }
    }

    /// `column [NOT] LIKE pattern`
    pub fn like(column: ColumnRef, pattern: impl Into<String>, negated: bool) -> Self {
        let op = if negated {
            Comparison::NotLike
        } else {
            Comparison::Like
        };
        Self::compare(column, op, SqlParam::String(pattern.into()))
    }

    /// `column [NOT] IN (values)`
    pub fn in_list(column: ColumnRef, values: Vec<SqlParam>, negated: bool) -> Self {
        Condition::In {
            column,
            values,
            negated,
        }
    }

    /// `column IS [NOT] NULL`
    pub fn null(column: ColumnRef, negated: bool) -> Self {
        Condition::Null { column, negated }
    }

    /// Raw SQL fragment.
    pub fn raw(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            params,
        }
    }

    fn is_renderable(&self) -> bool {
        match self {
            Condition::Group(group) => !group.is_empty(),
            Condition::Raw { sql, .. } => !sql.trim().is_empty(),
            _ => true,
        }
    }

    fn requalify(&mut self, from: &str, to: &str) {
        match self {
            Condition::Compare { column, .. }
            | Condition::In { column, .. }
            | Condition::Null { column, .. }
            | Condition::Between { column, .. } => column.requalify(from, to),
            Condition::Columns { left, right, .. } => {
                left.requalify(from, to);
                right.requalify(from, to);
            }
            Condition::Group(group) => group.requalify(from, to),
            Condition::Exists { query, .. } => query.where_mut().requalify(from, to),
            Condition::Raw { sql, .. } => *sql = requalify_expression(sql, from, to),
        }
    }

    /// Renders the condition into `out`.
    pub fn write(&self, out: &mut SqlFragment) {
        match self {
            Condition::Compare { column, op, value } => {
                out.push_str(&format!("{} {} ", column.to_sql(), op.as_sql()));
                out.push_param(value.clone());
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // Empty membership: IN matches nothing, NOT IN matches everything.
                    out.push_str(if *negated { "1 = 1" } else { "0 = 1" });
                    return;
                }
                out.push_str(&column.to_sql());
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_param(value.clone());
                }
                out.push_str(")");
            }
            Condition::Null { column, negated } => {
                out.push_str(&column.to_sql());
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Condition::Between { column, low, high } => {
                out.push_str(&format!("{} BETWEEN ", column.to_sql()));
                out.push_param(low.clone());
                out.push_str(" AND ");
                out.push_param(high.clone());
            }
            Condition::Columns { left, op, right } => {
                out.push_str(&format!(
                    "{} {} {}",
                    left.to_sql(),
                    op.as_sql(),
                    right.to_sql()
                ));
            }
            Condition::Raw { sql, params } => out.push_raw(sql, params),
            Condition::Group(group) => {
                out.push_str("(");
                group.write(out);
                out.push_str(")");
            }
            Condition::Exists { query, negated } => {
                out.push_str(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                query.write(out);
                out.push_str(")");
            }
        }
    }
}

/// How a condition attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        }
    }
}

/// An ordered list of conditions joined by AND/OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
    clauses: Vec<(Conjunction, Condition)>,
}

impl ConditionGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition with AND.
    pub fn and(&mut self, condition: Condition) -> &mut Self {
        self.push(Conjunction::And, condition)
    }

    /// Appends a condition with OR.
    pub fn or(&mut self, condition: Condition) -> &mut Self {
        self.push(Conjunction::Or, condition)
    }

    /// Appends a condition with the given conjunction.
    ///
    /// The conjunction of the first rendered condition is ignored.
    pub fn push(&mut self, conjunction: Conjunction, condition: Condition) -> &mut Self {
        self.clauses.push((conjunction, condition));
        self
    }

    /// Appends every clause of `other`, keeping their conjunctions.
    pub fn extend(&mut self, other: ConditionGroup) {
        self.clauses.extend(other.clauses);
    }

    /// Returns the clauses in order.
    pub fn clauses(&self) -> &[(Conjunction, Condition)] {
        &self.clauses
    }

    /// Returns true if nothing in the group would render.
    pub fn is_empty(&self) -> bool {
        !self.clauses.iter().any(|(_, c)| c.is_renderable())
    }

    /// Number of clauses, renderable or not.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Rewrites every named column qualified with `from` to be qualified with `to`.
    pub fn requalify(&mut self, from: &str, to: &str) {
        for (_, condition) in &mut self.clauses {
            condition.requalify(from, to);
        }
    }

    /// Renders the group (without surrounding parentheses) into `out`.
    pub fn write(&self, out: &mut SqlFragment) {
        let mut first = true;
        for (conjunction, condition) in &self.clauses {
            if !condition.is_renderable() {
                continue;
            }
            if !first {
                out.push_str(conjunction.as_sql());
            }
            condition.write(out);
            first = false;
        }
    }

    /// Renders the group into a standalone fragment.
    pub fn build(&self) -> SqlFragment {
        let mut out = SqlFragment::default();
        self.write(&mut out);
        out
    }
}
