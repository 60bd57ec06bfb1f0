//! Entity introspection.
//!
//! The engine learns everything it knows about a searchable entity through
//! [`SearchEntity`]: its table, cast fields, configured search attributes and
//! declared relationships. Optional behaviour (list lookups, named scopes,
//! value transforms) is exposed through capability traits the entity may
//! hand out.

mod schema;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::query::ConditionGroup;
use crate::types::FilterType;

pub use schema::{RelationshipDefinition, Schema, SchemaEntity, EntityDefinition};

/// A searchable entity.
pub trait SearchEntity: Send + Sync {
    /// Storage table name.
    fn table(&self) -> &str;

    /// Primary key column.
    fn primary_key(&self) -> &str {
        "id"
    }

    /// Cast fields: column name → cast kind (`integer`, `string`, `boolean`, ...),
    /// in declaration order.
    fn cast_fields(&self) -> Vec<(String, String)>;

    /// Explicitly configured search attributes, in declaration order.
    fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
        Vec::new()
    }

    /// Names of relationships whose attributes are searchable.
    fn search_relationships(&self) -> Vec<String> {
        Vec::new()
    }

    /// Resolves a declared relationship.
    fn relation(&self, _name: &str) -> Option<Relation> {
        None
    }

    /// List lookup hooks, if the entity has any.
    fn list_lookup(&self) -> Option<&dyn ListLookupProvider> {
        None
    }

    /// Named scopes, if the entity has any.
    fn scopes(&self) -> Option<&dyn ScopeProvider> {
        None
    }

    /// Value transform hooks, if the entity has any.
    fn value_transformer(&self) -> Option<&dyn ValueTransformer> {
        None
    }

    /// `table.primary_key`
    fn qualified_key(&self) -> String {
        format!("{}.{}", self.table(), self.primary_key())
    }
}

/// Resolves list-lookup filter values into membership sets.
pub trait ListLookupProvider: Send + Sync {
    /// True if `source` can be looked up.
    fn has_lookup(&self, source: &str) -> bool;

    /// Resolves `value` for `source`. `None` means the value matched nothing
    /// usable and the filter should be dropped.
    fn lookup(&self, source: &str, value: &Value) -> Option<Vec<Value>>;
}

/// Named predicates applied in place of a column comparison.
pub trait ScopeProvider: Send + Sync {
    /// True if a scope named `source` exists.
    fn has_scope(&self, source: &str) -> bool;

    /// Adds the scope's conditions to `group`.
    fn apply_scope(&self, source: &str, group: &mut ConditionGroup, value: &Value, positive: bool);
}

/// Rewrites filter values before lookups and scopes see them.
pub trait ValueTransformer: Send + Sync {
    /// Returns the transformed value, or `None` when `source` has no transform.
    fn transform(&self, source: &str, value: &Value) -> Option<Value>;
}

/// Attribute toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeToggles {
    /// Match the value's characters in order with anything between them.
    #[serde(rename = "wild-all")]
    pub wild_all: bool,
}

/// Configuration for an explicitly declared search attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Display title; defaults to the title-cased attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Storage references (`table.column`, `#raw sql`); defaults to `table.name`.
    #[serde(alias = "attribute", deserialize_with = "one_or_many")]
    pub attributes: Vec<String>,
    /// Filter type; defaults to string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterType>,
    /// Behaviour toggles.
    pub enable: AttributeToggles,
    /// Name handed to lookup, scope and transform hooks; defaults to the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Model whose records supply selectable values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Key column of `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_key: Option<String>,
    /// Display column of `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl AttributeConfig {
    /// Creates an empty attribute configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Adds a storage reference.
    pub fn column(mut self, reference: impl Into<String>) -> Self {
        self.attributes.push(reference.into());
        self
    }

    /// Sets the filter type.
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Enables wild-all matching.
    pub fn wild_all(mut self) -> Self {
        self.enable.wild_all = true;
        self
    }

    /// Sets the hook source name.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the model supplying selectable values.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// The parent row holds the foreign key.
    BelongsTo,
    /// The related row holds the foreign key; at most one related row.
    HasOne,
    /// The related rows hold the foreign key.
    HasMany,
    /// Linked through a pivot table.
    BelongsToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::BelongsTo => write!(f, "belongsTo"),
            RelationKind::HasOne => write!(f, "hasOne"),
            RelationKind::HasMany => write!(f, "hasMany"),
            RelationKind::BelongsToMany => write!(f, "belongsToMany"),
        }
    }
}

/// Pivot table of a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    /// Pivot table name.
    pub table: String,
    /// Pivot column referencing the parent.
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related entity.
    pub related_pivot_key: String,
}

/// A declared relationship, as returned by [`SearchEntity::relation`].
///
/// For direct relationships rows match on
/// `parent.parent_column = related.related_column`. Many-to-many
/// relationships match `parent.parent_column = pivot.foreign_pivot_key` and
/// `pivot.related_pivot_key = related.related_column`.
#[derive(Clone)]
pub struct Relation {
    /// Relationship kind.
    pub kind: RelationKind,
    /// The related entity.
    pub related: Arc<dyn SearchEntity>,
    /// Join column on the parent table.
    pub parent_column: String,
    /// Join column on the related table.
    pub related_column: String,
    /// Pivot table, for many-to-many relationships.
    pub pivot: Option<Pivot>,
}

impl Relation {
    /// The parent holds `foreign_key`, pointing at the related `owner_key`.
    pub fn belongs_to(
        related: Arc<dyn SearchEntity>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            related,
            parent_column: foreign_key.into(),
            related_column: owner_key.into(),
            pivot: None,
        }
    }

    /// The related entity holds `foreign_key`, pointing at the parent `local_key`.
    pub fn has_one(
        related: Arc<dyn SearchEntity>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::HasOne,
            related,
            parent_column: local_key.into(),
            related_column: foreign_key.into(),
            pivot: None,
        }
    }

    /// Like [`has_one`](Self::has_one), for any number of related rows.
    pub fn has_many(
        related: Arc<dyn SearchEntity>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::HasMany,
            ..Self::has_one(related, foreign_key, local_key)
        }
    }

    /// Linked through `pivot`; `parent_key` and `related_key` are the columns
    /// the pivot keys reference.
    pub fn belongs_to_many(
        related: Arc<dyn SearchEntity>,
        pivot: Pivot,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::BelongsToMany,
            related,
            parent_column: parent_key.into(),
            related_column: related_key.into(),
            pivot: Some(pivot),
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("kind", &self.kind)
            .field("related", &self.related.table())
            .field("parent_column", &self.parent_column)
            .field("related_column", &self.related_column)
            .field("pivot", &self.pivot)
            .finish()
    }
}
