//! Join planning.
//!
//! Every relationship referenced by a request is joined exactly once, under
//! an alias of the form `<table>_<relationship>_<token>`. The random token
//! keeps aliases unique when the same table is reached through several
//! relationships, or is already part of the caller's query.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::config::{RelationStrategy, SearchConfig};
use crate::query::{ColumnRef, Comparison, Condition, Join, JoinKind, SelectQuery, quote_identifier};
use crate::resolver::RelationshipDescriptor;

/// Aliases assigned to one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJoin {
    /// Relationship name.
    pub relationship: String,
    /// Related table.
    pub related_table: String,
    /// Alias of the related table.
    pub alias: String,
    /// Alias of the pivot table, for many-to-many relationships.
    pub pivot_alias: Option<String>,
}

/// The aliases assigned for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    joins: Vec<PlannedJoin>,
}

impl JoinPlan {
    /// The planned join for a relationship.
    pub fn get(&self, relationship: &str) -> Option<&PlannedJoin> {
        self.joins.iter().find(|j| j.relationship == relationship)
    }

    /// Planned joins in request order.
    pub fn iter(&self) -> impl Iterator<Item = &PlannedJoin> {
        self.joins.iter()
    }

    /// True when no relationship is referenced.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }
}

/// Assigns aliases and adds relationship joins to a query.
pub struct JoinPlanner<'a> {
    config: &'a SearchConfig,
    key: String,
    taken: HashSet<String>,
}

impl<'a> JoinPlanner<'a> {
    /// Creates a planner for `query`, whose rows are identified by the
    /// qualified primary key `key`. Names the query already uses are never
    /// handed out as aliases.
    pub fn new(config: &'a SearchConfig, key: impl Into<String>, query: &SelectQuery) -> Self {
        let mut taken = HashSet::new();
        taken.insert(query.table().to_string());
        for join in query.joins() {
            taken.insert(join.reference_name().to_string());
        }
        Self {
            config,
            key: key.into(),
            taken,
        }
    }

    /// Plans the referenced relationships. With the join strategy the joins
    /// are added to `query` too, along with a `DISTINCT key, table.*`
    /// projection when the query selects nothing explicitly.
    pub fn plan(
        &mut self,
        relationships: &[&RelationshipDescriptor],
        query: &mut SelectQuery,
    ) -> JoinPlan {
        let mut plan = JoinPlan::default();

        for relationship in relationships {
            if plan.get(&relationship.name).is_some() {
                continue;
            }

            let alias = self.alias(&relationship.related_table, &relationship.name);
            let pivot_alias = relationship
                .many_to_many
                .as_ref()
                .map(|m2m| self.alias(&m2m.pivot_table, &relationship.name));

            debug!(
                relationship = %relationship.name,
                table = %relationship.related_table,
                alias = %alias,
                strategy = %self.config.relation_strategy,
                "Planned relationship join"
            );

            let planned = PlannedJoin {
                relationship: relationship.name.clone(),
                related_table: relationship.related_table.clone(),
                alias,
                pivot_alias,
            };

            if self.config.relation_strategy == RelationStrategy::Join {
                for join in joins_for(relationship, &planned, self.config.join_type) {
                    query.join(join);
                }
            }
            plan.joins.push(planned);
        }

        if self.config.relation_strategy == RelationStrategy::Join
            && !plan.is_empty()
            && self.config.distinct_on_join
            && !query.has_columns()
        {
            let projection = format!(
                "DISTINCT {}, {}",
                quote_identifier(&self.key),
                quote_identifier(&format!("{}.*", query.table()))
            );
            query.select_raw(projection);
        }

        plan
    }

    /// Returns a fresh alias for `table` reached through `relationship`.
    pub fn alias(&mut self, table: &str, relationship: &str) -> String {
        let relationship: String = relationship
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        loop {
            let token: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(self.config.alias_token_length)
                .collect();
            let alias = format!("{}_{}_{}", table, relationship, token);
            if self.taken.insert(alias.clone()) {
                return alias;
            }
        }
    }
}

/// `table.column` → `alias.column`
fn rebase(qualified: &str, alias: &str) -> String {
    let column = qualified
        .rsplit_once('.')
        .map(|(_, column)| column)
        .unwrap_or(qualified);
    format!("{}.{}", alias, column)
}

fn column_match(left: String, right: String) -> Condition {
    Condition::Columns {
        left: ColumnRef::Named(left),
        op: Comparison::Eq,
        right: ColumnRef::Named(right),
    }
}

/// Joins linking the base table to a relationship's aliased table.
pub fn joins_for(
    relationship: &RelationshipDescriptor,
    planned: &PlannedJoin,
    kind: JoinKind,
) -> Vec<Join> {
    match (&relationship.many_to_many, &planned.pivot_alias) {
        (Some(m2m), Some(pivot_alias)) => vec![
            Join::new(kind, &m2m.pivot_table)
                .alias(pivot_alias)
                .on(column_match(
                    relationship.parent_key.clone(),
                    rebase(&relationship.foreign_key, pivot_alias),
                )),
            Join::new(kind, &relationship.related_table)
                .alias(&planned.alias)
                .on(column_match(
                    rebase(&m2m.pivot_related_key, pivot_alias),
                    rebase(&m2m.related_key, &planned.alias),
                )),
        ],
        _ => vec![
            Join::new(kind, &relationship.related_table)
                .alias(&planned.alias)
                .on(column_match(
                    relationship.parent_key.clone(),
                    rebase(&relationship.foreign_key, &planned.alias),
                )),
        ],
    }
}

/// A correlated subquery selecting the related rows of the current base row.
///
/// The caller adds the relationship's filters to its WHERE clause.
pub fn exists_subquery(relationship: &RelationshipDescriptor, planned: &PlannedJoin) -> SelectQuery {
    match (&relationship.many_to_many, &planned.pivot_alias) {
        (Some(m2m), Some(pivot_alias)) => {
            let mut query = SelectQuery::from_as(&m2m.pivot_table, pivot_alias);
            query
                .join(
                    Join::new(JoinKind::Inner, &relationship.related_table)
                        .alias(&planned.alias)
                        .on(column_match(
                            rebase(&m2m.pivot_related_key, pivot_alias),
                            rebase(&m2m.related_key, &planned.alias),
                        )),
                )
                .and_where(column_match(
                    relationship.parent_key.clone(),
                    rebase(&relationship.foreign_key, pivot_alias),
                ));
            query
        }
        _ => {
            let mut query = SelectQuery::from_as(&relationship.related_table, &planned.alias);
            query.and_where(column_match(
                relationship.parent_key.clone(),
                rebase(&relationship.foreign_key, &planned.alias),
            ));
            query
        }
    }
}
