//! Attribute resolution.
//!
//! Builds the map of searchable field names for an entity:
//!
//! 1. each searchable relationship contributes its related entity's cast and
//!    configured attributes, namespaced `relationship.attribute`
//! 2. the entity's own cast fields become attributes, typed by cast kind
//! 3. configured search attributes are layered on top, replacing cast
//!    attributes of the same name

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::entity::{AttributeConfig, RelationKind, SearchEntity};
use crate::query::ColumnRef;
use crate::types::FilterType;

/// Display column used for source models that do not name one.
pub const DEFAULT_MODEL_NAME: &str = "display_name";

/// Which entity an attribute belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// The entity being searched.
    Entity,
    /// A related entity, by relationship name.
    Relationship(String),
}

impl Owner {
    /// The relationship name, for related attributes.
    pub fn relationship(&self) -> Option<&str> {
        match self {
            Owner::Entity => None,
            Owner::Relationship(name) => Some(name),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Entity => write!(f, "self"),
            Owner::Relationship(name) => write!(f, "{}", name),
        }
    }
}

/// Model whose records supply the selectable values of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceModel {
    /// Model name.
    pub model: String,
    /// Key column.
    pub key: Option<String>,
    /// Display column.
    pub name: String,
}

/// A searchable attribute.
#[derive(Clone)]
pub struct AttributeDescriptor {
    /// Field name as used in requests (`relationship.attribute` for related ones).
    pub name: String,
    /// Display title.
    pub title: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Storage references the filter is applied to, in order. Never empty.
    pub columns: Vec<ColumnRef>,
    /// Owning side.
    pub owner: Owner,
    /// Hook source name for lookups, scopes and transforms.
    pub source: Option<String>,
    /// Wild-all matching enabled.
    pub wild_all: bool,
    /// Source model metadata.
    pub source_model: Option<SourceModel>,
    /// Entity the attribute was declared on.
    pub entity: Arc<dyn SearchEntity>,
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("filter_type", &self.filter_type)
            .field("columns", &self.columns)
            .field("owner", &self.owner)
            .field("source", &self.source)
            .field("wild_all", &self.wild_all)
            .field("entity", &self.entity.table())
            .finish()
    }
}

/// Join keys of a relationship, qualified with their table names.
#[derive(Clone)]
pub struct RelationshipDescriptor {
    /// Relationship name.
    pub name: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Related table.
    pub related_table: String,
    /// `parent_table.column` matched by the first join.
    pub parent_key: String,
    /// `table.column` on the other side of the first join: the related table,
    /// or the pivot for many-to-many relationships.
    pub foreign_key: String,
    /// Second hop of a many-to-many relationship.
    pub many_to_many: Option<ManyToManyJoin>,
    /// The related entity.
    pub entity: Arc<dyn SearchEntity>,
}

/// Pivot-to-related hop of a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToManyJoin {
    /// Pivot table.
    pub pivot_table: String,
    /// `pivot.related_pivot_key`
    pub pivot_related_key: String,
    /// `related_table.related_column`
    pub related_key: String,
}

impl fmt::Debug for RelationshipDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("related_table", &self.related_table)
            .field("parent_key", &self.parent_key)
            .field("foreign_key", &self.foreign_key)
            .field("many_to_many", &self.many_to_many)
            .finish()
    }
}

/// Searchable attributes and relationships of an entity.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    attributes: BTreeMap<String, Arc<AttributeDescriptor>>,
    relationships: BTreeMap<String, RelationshipDescriptor>,
}

impl AttributeMap {
    /// Looks up an attribute by field name.
    pub fn get(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes.get(name)
    }

    /// Looks up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.get(name)
    }

    /// All attributes, sorted by name.
    pub fn attributes(&self) -> impl Iterator<Item = &Arc<AttributeDescriptor>> {
        self.attributes.values()
    }

    /// All relationships, sorted by name.
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.relationships.values()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True if nothing is searchable.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Resolves the searchable attributes of `entity`.
pub fn resolve(entity: &Arc<dyn SearchEntity>) -> AttributeMap {
    let mut map = AttributeMap::default();

    for relationship in entity.search_relationships() {
        let Some(relation) = entity.relation(&relationship) else {
            debug!(
                entity = %entity.table(),
                relationship = %relationship,
                "Skipping unknown search relationship"
            );
            continue;
        };

        let descriptor = describe_relationship(entity.as_ref(), &relationship, &relation);
        let owner = Owner::Relationship(relationship.clone());
        for attribute in entity_attributes(&relation.related, &owner) {
            let name = format!("{}.{}", relationship, attribute.name);
            map.attributes.insert(
                name.clone(),
                Arc::new(AttributeDescriptor { name, ..attribute }),
            );
        }
        map.relationships.insert(relationship, descriptor);
    }

    for attribute in entity_attributes(entity, &Owner::Entity) {
        map.attributes
            .insert(attribute.name.clone(), Arc::new(attribute));
    }

    trace!(
        entity = %entity.table(),
        attributes = map.attributes.len(),
        relationships = map.relationships.len(),
        "Resolved search attributes"
    );

    map
}

/// Cast attributes overlaid with configured ones, owned by `owner`.
fn entity_attributes(
    entity: &Arc<dyn SearchEntity>,
    owner: &Owner,
) -> Vec<AttributeDescriptor> {
    let table = entity.table().to_string();
    let mut attributes: BTreeMap<String, AttributeDescriptor> = BTreeMap::new();

    for (name, cast) in entity.cast_fields() {
        let Some(filter_type) = FilterType::from_cast(&cast) else {
            trace!(table = %table, field = %name, cast = %cast, "Cast is not searchable");
            continue;
        };
        attributes.insert(
            name.clone(),
            AttributeDescriptor {
                title: name.clone(),
                filter_type,
                columns: vec![ColumnRef::named(format!("{}.{}", table, name))],
                owner: owner.clone(),
                source: None,
                wild_all: false,
                source_model: None,
                entity: entity.clone(),
                name,
            },
        );
    }

    for (name, config) in entity.search_attributes() {
        let descriptor = configured_attribute(entity, &table, &name, config, owner);
        attributes.insert(name, descriptor);
    }

    attributes.into_values().collect()
}

fn configured_attribute(
    entity: &Arc<dyn SearchEntity>,
    table: &str,
    name: &str,
    config: AttributeConfig,
    owner: &Owner,
) -> AttributeDescriptor {
    let title = match config.title {
        Some(title) if title != name => title,
        _ => title_case(name),
    };

    let mut columns: Vec<ColumnRef> = config
        .attributes
        .iter()
        .map(|reference| storage_ref(table, reference))
        .collect();
    if columns.is_empty() {
        columns.push(ColumnRef::named(format!("{}.{}", table, name)));
    }

    let source_model = config.model.map(|model| SourceModel {
        model,
        key: config.model_key,
        name: config
            .model_name
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
    });

    AttributeDescriptor {
        name: name.to_string(),
        title,
        filter_type: config.filter.unwrap_or_default(),
        columns,
        owner: owner.clone(),
        source: Some(config.source.unwrap_or_else(|| name.to_string())),
        wild_all: config.enable.wild_all,
        source_model,
        entity: entity.clone(),
    }
}

/// Parses a configured storage reference.
///
/// `#expr` and `{expr}` are raw SQL expressions; bare column names are
/// qualified with the entity's table.
pub fn storage_ref(table: &str, reference: &str) -> ColumnRef {
    let reference = reference.trim();
    if let Some(raw) = reference.strip_prefix('#') {
        return ColumnRef::raw(raw.trim());
    }
    if let Some(raw) = reference.strip_prefix('{') {
        let raw = raw.strip_suffix('}').unwrap_or(raw);
        return ColumnRef::raw(raw.trim());
    }
    if reference.contains('.') {
        ColumnRef::named(reference)
    } else {
        ColumnRef::named(format!("{}.{}", table, reference))
    }
}

fn describe_relationship(
    parent: &dyn SearchEntity,
    name: &str,
    relation: &crate::entity::Relation,
) -> RelationshipDescriptor {
    let related_table = relation.related.table().to_string();
    let parent_key = format!("{}.{}", parent.table(), relation.parent_column);

    let (foreign_key, many_to_many) = match &relation.pivot {
        Some(pivot) => (
            format!("{}.{}", pivot.table, pivot.foreign_pivot_key),
            Some(ManyToManyJoin {
                pivot_table: pivot.table.clone(),
                pivot_related_key: format!("{}.{}", pivot.table, pivot.related_pivot_key),
                related_key: format!("{}.{}", related_table, relation.related_column),
            }),
        ),
        None => (
            format!("{}.{}", related_table, relation.related_column),
            None,
        ),
    };

    RelationshipDescriptor {
        name: name.to_string(),
        kind: relation.kind,
        related_table,
        parent_key,
        foreign_key,
        many_to_many,
        entity: relation.related.clone(),
    }
}

/// `first_name` → `First Name`
pub fn title_case(name: &str) -> String {
    name.split(['_', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
