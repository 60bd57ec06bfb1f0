//! Search entry point.
//!
//! [`ModelSearch`] ties the pipeline together for one entity: it resolves the
//! entity's searchable attributes once, then for each request normalizes the
//! filters, plans relationship joins and compiles the WHERE clause onto the
//! caller's query.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::compiler::PredicateCompiler;
use crate::config::SearchConfig;
use crate::entity::SearchEntity;
use crate::error::SearchResult;
use crate::normalizer::{NormalizedFilter, normalize_field};
use crate::operators::{self, Operator};
use crate::planner::JoinPlanner;
use crate::query::SelectQuery;
use crate::resolver::{self, AttributeMap, Owner, RelationshipDescriptor, SourceModel};
use crate::types::{FilterType, SearchRequest};

/// Normalized filters of one request field.
#[derive(Debug, Clone)]
pub struct FieldFilters {
    /// Canonical field name.
    pub field: String,
    /// Filters that survived normalization, in request order.
    pub filters: Vec<NormalizedFilter>,
}

/// Fields owned by the searched entity or by one relationship.
#[derive(Debug, Clone)]
pub struct OwnerFilters {
    /// Owning side.
    pub owner: Owner,
    /// Fields in request order.
    pub fields: Vec<FieldFilters>,
}

/// The normalized form of a request, grouped by owner in order of first
/// appearance.
#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    /// Owner groups.
    pub groups: Vec<OwnerFilters>,
}

impl SearchPlan {
    fn push(&mut self, owner: &Owner, field: &str, filters: Vec<NormalizedFilter>) {
        let field = FieldFilters {
            field: field.to_string(),
            filters,
        };
        match self.groups.iter_mut().find(|group| &group.owner == owner) {
            Some(group) => group.fields.push(field),
            None => self.groups.push(OwnerFilters {
                owner: owner.clone(),
                fields: vec![field],
            }),
        }
    }

    /// Relationships that have at least one filter, in order of first appearance.
    pub fn relationships_referenced(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter_map(|group| group.owner.relationship())
            .collect()
    }

    /// Total number of normalized filters.
    pub fn filter_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|group| &group.fields)
            .map(|field| field.filters.len())
            .sum()
    }

    /// True when nothing in the request survived normalization.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Listing entry describing one searchable attribute, for building search forms.
#[derive(Debug, Clone, Serialize)]
pub struct SearchableAttribute {
    /// Field name to use in requests.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Filter type.
    pub filter: FilterType,
    /// Operators the filter type accepts.
    pub operators: &'static [Operator],
    /// Relationship the attribute is reached through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Source model supplying selectable values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_model: Option<SourceModel>,
}

/// Search over one entity.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use helios_model_search::{ModelSearch, SearchEntity, SelectQuery};
/// use serde_json::json;
///
/// struct Books;
///
/// impl SearchEntity for Books {
///     fn table(&self) -> &str {
///         "books"
///     }
///
///     fn cast_fields(&self) -> Vec<(String, String)> {
///         vec![("title".to_string(), "string".to_string())]
///     }
/// }
///
/// let search = ModelSearch::new(Arc::new(Books));
/// let query = search
///     .apply(SelectQuery::new("books"), json!({"title": "dune"}))
///     .unwrap();
/// assert_eq!(query.to_sql(), "SELECT * FROM \"books\" WHERE (\"books\".\"title\" LIKE ?1)");
/// ```
pub struct ModelSearch {
    entity: Arc<dyn SearchEntity>,
    config: SearchConfig,
    attributes: AttributeMap,
}

impl ModelSearch {
    /// Resolves the searchable attributes of `entity` with the default config.
    pub fn new(entity: Arc<dyn SearchEntity>) -> Self {
        let attributes = resolver::resolve(&entity);
        Self {
            entity,
            config: SearchConfig::default(),
            attributes,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// The searched entity.
    pub fn entity(&self) -> &Arc<dyn SearchEntity> {
        &self.entity
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The resolved attribute map.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Decodes a request and canonicalizes its relationship field names.
    pub fn parse_request(&self, request: impl Into<SearchRequest>) -> SearchRequest {
        self.canonicalize(request.into())
    }

    fn canonicalize(&self, request: SearchRequest) -> SearchRequest {
        request.canonicalize(&self.config.path_separator, |name| {
            self.attributes.relationship(name).is_some()
        })
    }

    /// Normalizes a request against the attribute map.
    ///
    /// Unknown fields are skipped. Fails only when an attribute is
    /// misconfigured.
    pub fn plan(&self, request: &SearchRequest) -> SearchResult<SearchPlan> {
        let request = self.canonicalize(request.clone());
        let mut plan = SearchPlan::default();

        for (field, raw) in request.iter() {
            let Some(attribute) = self.attributes.get(field) else {
                debug!(entity = %self.entity.table(), field = %field, "Ignoring unknown search field");
                continue;
            };

            let filters = normalize_field(raw, attribute)?;
            if filters.is_empty() {
                trace!(field = %field, "No usable filters");
                continue;
            }
            plan.push(&attribute.owner, field, filters);
        }

        Ok(plan)
    }

    /// Applies a request to `query` and returns it.
    pub fn apply(
        &self,
        mut query: SelectQuery,
        request: impl Into<SearchRequest>,
    ) -> SearchResult<SelectQuery> {
        self.config.check()?;

        let plan = self.plan(&request.into())?;
        if plan.is_empty() {
            debug!(entity = %self.entity.table(), "Search request has no usable filters");
            return Ok(query);
        }

        let relationships: Vec<&RelationshipDescriptor> = plan
            .relationships_referenced()
            .into_iter()
            .filter_map(|name| self.attributes.relationship(name))
            .collect();

        let joins = JoinPlanner::new(&self.config, self.entity.qualified_key(), &query)
            .plan(&relationships, &mut query);
        PredicateCompiler::new(&self.config, &self.attributes).compile(&plan, &joins, &mut query);

        debug!(
            entity = %self.entity.table(),
            filters = plan.filter_count(),
            relationships = relationships.len(),
            strategy = %self.config.relation_strategy,
            "Applied search"
        );

        Ok(query)
    }

    /// Every searchable attribute with its accepted operators, sorted by name.
    pub fn searchable_attributes(&self) -> Vec<SearchableAttribute> {
        self.attributes
            .attributes()
            .filter(|attribute| attribute.filter_type.default_operator().is_some())
            .map(|attribute| SearchableAttribute {
                name: attribute.name.clone(),
                title: attribute.title.clone(),
                filter: attribute.filter_type,
                operators: operators::operators(attribute.filter_type),
                relationship: attribute.owner.relationship().map(str::to_string),
                source_model: attribute.source_model.clone(),
            })
            .collect()
    }
}

/// Applies `request` to `query` for `entity` with the default configuration.
pub fn apply_search(
    query: SelectQuery,
    entity: &Arc<dyn SearchEntity>,
    request: impl Into<SearchRequest>,
) -> SearchResult<SelectQuery> {
    ModelSearch::new(entity.clone()).apply(query, request)
}
