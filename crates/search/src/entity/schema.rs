//! Declarative entity schemas.
//!
//! Entities can be described in a JSON document instead of implementing
//! [`SearchEntity`] by hand:
//!
//! ```json
//! {
//!   "entities": {
//!     "orders": {
//!       "casts": {"id": "integer", "reference": "string", "total": "numeric"},
//!       "search_attributes": {
//!         "status": {"filter": "listLookup"}
//!       },
//!       "relationships": {
//!         "customer": {"kind": "belongsTo", "entity": "customers"}
//!       },
//!       "lookups": {
//!         "status": {"open": ["new", "paid"], "closed": ["shipped"]}
//!       }
//!     },
//!     "customers": {
//!       "casts": {"id": "integer", "name": "string"}
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{AttributeConfig, ListLookupProvider, Pivot, Relation, RelationKind, SearchEntity};
use crate::error::SchemaError;

/// A set of entity definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Entity definitions by name.
    pub entities: BTreeMap<String, EntityDefinition>,
}

/// One entity of a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDefinition {
    /// Table name; defaults to the entity name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Primary key column; defaults to `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Column → cast kind.
    pub casts: BTreeMap<String, String>,
    /// Configured search attributes.
    pub search_attributes: BTreeMap<String, AttributeConfig>,
    /// Declared relationships.
    pub relationships: BTreeMap<String, RelationshipDefinition>,
    /// Relationships whose attributes are searchable; defaults to all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_relationships: Option<Vec<String>>,
    /// Static list lookups: source → input value → resolved values.
    pub lookups: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

/// A relationship of an [`EntityDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    /// Relationship kind.
    pub kind: RelationKind,
    /// Name of the related entity in the same schema.
    pub entity: String,
    /// belongsTo: parent column (default `<relationship>_id`).
    /// hasOne/hasMany: related column (required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    /// Related column referenced by belongsTo / belongsToMany (default: related primary key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<String>,
    /// Parent column referenced by hasOne / hasMany / belongsToMany (default: primary key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_key: Option<String>,
    /// Pivot table (belongsToMany only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<PivotDefinition>,
}

/// Pivot table of a belongsToMany relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotDefinition {
    /// Pivot table name.
    pub table: String,
    /// Pivot column referencing the parent.
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related entity.
    pub related_pivot_key: String,
}

impl EntityDefinition {
    fn table_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or(name)
    }

    fn primary_key(&self) -> &str {
        self.primary_key.as_deref().unwrap_or("id")
    }
}

impl Schema {
    /// Parses and validates a JSON schema document.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Reads, parses and validates a JSON schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Checks that relationships are complete and point at defined entities.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (name, definition) in &self.entities {
            for (relationship, rel) in &definition.relationships {
                if !self.entities.contains_key(&rel.entity) {
                    return Err(SchemaError::UnknownEntity {
                        entity: name.clone(),
                        relationship: relationship.clone(),
                        target: rel.entity.clone(),
                    });
                }

                let problem = match rel.kind {
                    RelationKind::HasOne | RelationKind::HasMany if rel.foreign_key.is_none() => {
                        Some("hasOne/hasMany relationships need a foreign_key")
                    }
                    RelationKind::BelongsToMany if rel.pivot.is_none() => {
                        Some("belongsToMany relationships need a pivot")
                    }
                    _ => None,
                };
                if let Some(message) = problem {
                    return Err(SchemaError::InvalidEntity {
                        entity: name.clone(),
                        message: format!("relationship '{}': {}", relationship, message),
                    });
                }
            }

            if let Some(names) = &definition.search_relationships {
                if let Some(missing) = names
                    .iter()
                    .find(|n| !definition.relationships.contains_key(*n))
                {
                    return Err(SchemaError::InvalidEntity {
                        entity: name.clone(),
                        message: format!("search relationship '{}' is not declared", missing),
                    });
                }
            }
        }
        Ok(())
    }

    /// Entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    /// Returns a searchable handle for the named entity.
    pub fn entity(self: &Arc<Self>, name: &str) -> Result<Arc<dyn SearchEntity>, SchemaError> {
        let entity = SchemaEntity::new(self.clone(), name)?;
        Ok(Arc::new(entity))
    }
}

/// A [`SearchEntity`] backed by a [`Schema`] definition.
#[derive(Debug, Clone)]
pub struct SchemaEntity {
    schema: Arc<Schema>,
    name: String,
    table: String,
    definition: EntityDefinition,
}

impl SchemaEntity {
    /// Creates a handle for the named entity.
    pub fn new(schema: Arc<Schema>, name: &str) -> Result<Self, SchemaError> {
        let definition = schema
            .entities
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::EntityNotFound(name.to_string()))?;
        Ok(Self {
            table: definition.table_or(name).to_string(),
            name: name.to_string(),
            schema,
            definition,
        })
    }

    /// The entity's name within its schema.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SearchEntity for SchemaEntity {
    fn table(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        self.definition.primary_key()
    }

    fn cast_fields(&self) -> Vec<(String, String)> {
        self.definition
            .casts
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
        self.definition
            .search_attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn search_relationships(&self) -> Vec<String> {
        match &self.definition.search_relationships {
            Some(names) => names.clone(),
            None => self.definition.relationships.keys().cloned().collect(),
        }
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        let rel = self.definition.relationships.get(name)?;
        let related = match SchemaEntity::new(self.schema.clone(), &rel.entity) {
            Ok(related) => related,
            Err(e) => {
                debug!(relationship = %name, error = %e, "Skipping unresolvable relationship");
                return None;
            }
        };

        let owner_key = rel
            .owner_key
            .clone()
            .unwrap_or_else(|| related.primary_key().to_string());
        let local_key = rel
            .local_key
            .clone()
            .unwrap_or_else(|| self.primary_key().to_string());
        let related: Arc<dyn SearchEntity> = Arc::new(related);

        let relation = match rel.kind {
            RelationKind::BelongsTo => {
                let foreign_key = rel
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", snake_case(name)));
                Relation::belongs_to(related, foreign_key, owner_key)
            }
            RelationKind::HasOne => Relation::has_one(related, rel.foreign_key.clone()?, local_key),
            RelationKind::HasMany => {
                Relation::has_many(related, rel.foreign_key.clone()?, local_key)
            }
            RelationKind::BelongsToMany => {
                let pivot = rel.pivot.as_ref()?;
                Relation::belongs_to_many(
                    related,
                    Pivot {
                        table: pivot.table.clone(),
                        foreign_pivot_key: pivot.foreign_pivot_key.clone(),
                        related_pivot_key: pivot.related_pivot_key.clone(),
                    },
                    local_key,
                    owner_key,
                )
            }
        };
        Some(relation)
    }

    fn list_lookup(&self) -> Option<&dyn ListLookupProvider> {
        if self.definition.lookups.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl ListLookupProvider for SchemaEntity {
    fn has_lookup(&self, source: &str) -> bool {
        self.definition.lookups.contains_key(source)
    }

    fn lookup(&self, source: &str, value: &Value) -> Option<Vec<Value>> {
        let table = self.definition.lookups.get(source)?;
        let keys: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(lookup_key).collect(),
            other => lookup_key(other).into_iter().collect(),
        };

        let mut resolved = Vec::new();
        let mut found = false;
        for key in keys {
            if let Some(values) = table.get(&key) {
                found = true;
                for v in values {
                    if !resolved.contains(v) {
                        resolved.push(v.clone());
                    }
                }
            }
        }

        found.then_some(resolved)
    }
}

fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `mockModel` → `mock_model`
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shop_schema() -> Arc<Schema> {
        let doc = json!({
            "entities": {
                "orders": {
                    "casts": {"id": "integer", "reference": "string"},
                    "relationships": {
                        "customer": {"kind": "belongsTo", "entity": "customers"},
                        "lines": {"kind": "hasMany", "entity": "order_lines", "foreign_key": "order_id"},
                        "tags": {
                            "kind": "belongsToMany",
                            "entity": "tags",
                            "pivot": {"table": "order_tag", "foreign_pivot_key": "order_id", "related_pivot_key": "tag_id"}
                        }
                    },
                    "lookups": {"status": {"open": ["new", "paid"]}}
                },
                "customers": {"casts": {"id": "integer", "name": "string"}},
                "order_lines": {"casts": {"sku": "string"}},
                "tags": {"table": "tag", "primary_key": "tag_id", "casts": {"label": "string"}}
            }
        });
        Arc::new(Schema::from_json(&doc.to_string()).unwrap())
    }

    #[test]
    fn test_entity_handle() {
        let schema = shop_schema();
        let orders = schema.entity("orders").unwrap();
        assert_eq!(orders.table(), "orders");
        assert_eq!(orders.primary_key(), "id");
        assert_eq!(orders.cast_fields().len(), 2);
        assert_eq!(orders.search_relationships(), vec!["customer", "lines", "tags"]);

        assert!(matches!(
            schema.entity("nope"),
            Err(SchemaError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_relation_defaults() {
        let schema = shop_schema();
        let orders = schema.entity("orders").unwrap();

        let customer = orders.relation("customer").unwrap();
        assert_eq!(customer.kind, RelationKind::BelongsTo);
        assert_eq!(customer.parent_column, "customer_id");
        assert_eq!(customer.related_column, "id");
        assert_eq!(customer.related.table(), "customers");

        let lines = orders.relation("lines").unwrap();
        assert_eq!(lines.parent_column, "id");
        assert_eq!(lines.related_column, "order_id");

        let tags = orders.relation("tags").unwrap();
        assert_eq!(tags.related.table(), "tag");
        assert_eq!(tags.related_column, "tag_id");
        assert_eq!(tags.pivot.as_ref().unwrap().table, "order_tag");

        assert!(orders.relation("missing").is_none());
    }

    #[test]
    fn test_static_lookup() {
        let schema = shop_schema();
        let orders = SchemaEntity::new(schema, "orders").unwrap();
        let lookup = orders.list_lookup().unwrap();

        assert!(lookup.has_lookup("status"));
        assert!(!lookup.has_lookup("colour"));
        assert_eq!(
            lookup.lookup("status", &json!("open")),
            Some(vec![json!("new"), json!("paid")])
        );
        assert_eq!(lookup.lookup("status", &json!("unknown")), None);
        assert_eq!(
            lookup.lookup("status", &json!(["open", "open"])),
            Some(vec![json!("new"), json!("paid")])
        );
    }

    #[test]
    fn test_unknown_relationship_target() {
        let doc = json!({
            "entities": {
                "orders": {"relationships": {"customer": {"kind": "belongsTo", "entity": "people"}}}
            }
        });
        assert!(matches!(
            Schema::from_json(&doc.to_string()),
            Err(SchemaError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_has_many_needs_foreign_key() {
        let doc = json!({
            "entities": {
                "a": {"relationships": {"bs": {"kind": "hasMany", "entity": "b"}}},
                "b": {}
            }
        });
        assert!(matches!(
            Schema::from_json(&doc.to_string()),
            Err(SchemaError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"entities": {"notes": {"casts": {"body": "text"}}}}"#).unwrap();

        let schema = Arc::new(Schema::from_path(&path).unwrap());
        assert_eq!(schema.entity_names(), vec!["notes"]);
        assert!(matches!(
            Schema::from_path(dir.path().join("missing.json")),
            Err(SchemaError::Io(_))
        ));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("mockModel"), "mock_model");
        assert_eq!(snake_case("owner"), "owner");
    }
}
