//! Predicate compilation.
//!
//! Turns normalized filters into WHERE conditions. Each filter becomes one
//! parenthesised group with the comparison applied to every storage reference
//! of its attribute: `(a LIKE ?1 OR b LIKE ?2)` for positive filters,
//! `(a NOT LIKE ?1 AND b NOT LIKE ?2)` for negative ones. The groups are then
//! attached to the query, either directly, against joined aliases, or inside
//! one correlated `EXISTS` per relationship.

use tracing::{debug, trace};

use crate::config::{RelationStrategy, SearchConfig, ValueCombination};
use crate::normalizer::{FilterMethod, NormalizedFilter};
use crate::planner::{JoinPlan, exists_subquery};
use crate::query::{ColumnRef, Condition, ConditionGroup, Conjunction, SelectQuery};
use crate::resolver::{AttributeMap, Owner, RelationshipDescriptor};
use crate::search::SearchPlan;

/// Attaches the conditions of a [`SearchPlan`] to a query.
pub struct PredicateCompiler<'a> {
    config: &'a SearchConfig,
    attributes: &'a AttributeMap,
}

impl<'a> PredicateCompiler<'a> {
    /// Creates a compiler for an entity's attribute map.
    pub fn new(config: &'a SearchConfig, attributes: &'a AttributeMap) -> Self {
        Self { config, attributes }
    }

    /// Adds the plan's conditions to `query`. `joins` holds the aliases the
    /// planner assigned to each referenced relationship.
    pub fn compile(&self, plan: &SearchPlan, joins: &JoinPlan, query: &mut SelectQuery) {
        if plan.is_empty() {
            return;
        }
        isolate_existing(query);

        for group in &plan.groups {
            match &group.owner {
                Owner::Entity => {
                    for field in &group.fields {
                        for condition in self.field_conditions(&field.filters, None) {
                            query.and_where(condition);
                        }
                    }
                }
                Owner::Relationship(name) => {
                    let (Some(relationship), Some(planned)) =
                        (self.attributes.relationship(name), joins.get(name))
                    else {
                        debug!(relationship = %name, "Skipping filters on unplanned relationship");
                        continue;
                    };

                    let alias = Aliasing {
                        relationship: relationship.name.as_str(),
                        table: relationship.related_table.as_str(),
                        alias: planned.alias.as_str(),
                    };
                    let mut conditions = ConditionGroup::new();
                    for field in &group.fields {
                        for condition in self.field_conditions(&field.filters, Some(&alias)) {
                            conditions.and(condition);
                        }
                    }
                    // Scopes add conditions against the related table name
                    conditions.requalify(alias.table, alias.alias);
                    conditions.requalify(alias.relationship, alias.alias);

                    match self.config.relation_strategy {
                        RelationStrategy::Join => query.where_mut().extend(conditions),
                        RelationStrategy::Exists => {
                            query.and_where(exists(relationship, planned, conditions));
                        }
                    }
                }
            }
            trace!(owner = %group.owner, fields = group.fields.len(), "Compiled owner group");
        }
    }

    /// Conditions for every filter of one field, combined per
    /// [`ValueCombination`].
    fn field_conditions(
        &self,
        filters: &[NormalizedFilter],
        alias: Option<&Aliasing<'_>>,
    ) -> Vec<Condition> {
        let groups = filters.iter().map(|filter| {
            let columns: Vec<ColumnRef> = match alias {
                Some(alias) => filter
                    .attribute
                    .columns
                    .iter()
                    .map(|column| alias.apply(column))
                    .collect(),
                None => filter.attribute.columns.clone(),
            };
            (filter.positive, filter_group_on(filter, &columns))
        });

        match self.config.value_combination {
            ValueCombination::All => groups
                .filter(|(_, group)| !group.is_empty())
                .map(|(_, group)| Condition::Group(group))
                .collect(),
            ValueCombination::Any => {
                let mut any = ConditionGroup::new();
                let mut conditions = Vec::new();
                for (positive, group) in groups {
                    if group.is_empty() {
                        continue;
                    }
                    if positive {
                        any.or(Condition::Group(group));
                    } else {
                        conditions.push(Condition::Group(group));
                    }
                }
                if !any.is_empty() {
                    conditions.insert(0, Condition::Group(any));
                }
                conditions
            }
        }
    }
}

struct Aliasing<'a> {
    relationship: &'a str,
    table: &'a str,
    alias: &'a str,
}

impl Aliasing<'_> {
    fn apply(&self, column: &ColumnRef) -> ColumnRef {
        let mut column = column.clone();
        column.requalify(self.table, self.alias);
        column.requalify(self.relationship, self.alias);
        column
    }
}

/// Compiles one filter against every storage reference of its attribute.
pub fn filter_group(filter: &NormalizedFilter) -> ConditionGroup {
    filter_group_on(filter, &filter.attribute.columns)
}

fn filter_group_on(filter: &NormalizedFilter, columns: &[ColumnRef]) -> ConditionGroup {
    let mut group = ConditionGroup::new();

    if let FilterMethod::Scope { source, value } = &filter.method {
        match filter.attribute.entity.scopes() {
            Some(scopes) => scopes.apply_scope(source, &mut group, value, filter.positive),
            None => debug!(field = %filter.attribute.name, scope = %source, "Entity has no scopes"),
        }
        return group;
    }

    let later = if filter.positive {
        Conjunction::Or
    } else {
        Conjunction::And
    };

    for (i, column) in columns.iter().enumerate() {
        let conjunction = if i == 0 { Conjunction::And } else { later };
        let condition = match &filter.method {
            FilterMethod::Compare { op, value } => {
                Condition::compare(column.clone(), *op, value.clone())
            }
            FilterMethod::In { values, negated } => {
                Condition::in_list(column.clone(), values.clone(), *negated)
            }
            FilterMethod::Null { negated } => Condition::null(column.clone(), *negated),
            FilterMethod::Between { low, high } => Condition::Between {
                column: column.clone(),
                low: low.clone(),
                high: high.clone(),
            },
            FilterMethod::Raw { template } => {
                Condition::raw(template.replace("{column}", &column.to_sql()), Vec::new())
            }
            FilterMethod::Scope { .. } => continue,
        };
        group.push(conjunction, condition);
    }

    group
}

fn exists(
    relationship: &RelationshipDescriptor,
    planned: &crate::planner::PlannedJoin,
    conditions: ConditionGroup,
) -> Condition {
    let mut subquery = exists_subquery(relationship, planned);
    subquery.where_mut().extend(conditions);
    Condition::Exists {
        query: Box::new(subquery),
        negated: false,
    }
}

/// Wraps the caller's WHERE tree in parentheses when it contains an OR, so
/// the search conditions AND with all of it.
fn isolate_existing(query: &mut SelectQuery) {
    let has_or = query
        .wheres()
        .clauses()
        .iter()
        .skip(1)
        .any(|(conjunction, _)| *conjunction == Conjunction::Or);
    if has_or {
        let existing = std::mem::take(query.where_mut());
        query.where_group(existing);
    }
}
