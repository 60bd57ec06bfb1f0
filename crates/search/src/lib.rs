//! Helios Model Search
//!
//! This crate turns loosely structured search requests (field name → filter
//! expression) into composed SQL queries over relational entities, following
//! declared relationships with aliased joins.
//!
//! # Features
//!
//! - **Typed filters**: string, number, boolean, list, list-lookup, scope and uuid
//!   attributes, each with its own operator catalog
//! - **Lenient parsing**: requests as native maps, JSON text or URL query strings;
//!   unknown fields and unusable values are dropped, never reported
//! - **Relationships**: `relationship.attribute` fields are joined once per
//!   relationship under a collision-free alias, or matched with `EXISTS`
//! - **Parameterized output**: values are always bound, identifiers always quoted
//!
//! # Architecture
//!
//! - [`operators`] - Operator catalog per filter type
//! - [`resolver`] - Searchable attributes of an entity
//! - [`normalizer`] - Raw filter expressions → normalized filters
//! - [`planner`] - Relationship joins and aliases
//! - [`compiler`] - Normalized filters → WHERE conditions
//! - [`query`] - The `SelectQuery` builder search is applied to
//! - [`entity`] - Entity introspection traits and declarative schemas
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use helios_model_search::{AttributeConfig, ModelSearch, SearchEntity, SelectQuery};
//! use serde_json::json;
//!
//! struct Contacts;
//!
//! impl SearchEntity for Contacts {
//!     fn table(&self) -> &str {
//!         "contacts"
//!     }
//!
//!     fn cast_fields(&self) -> Vec<(String, String)> {
//!         vec![
//!             ("id".to_string(), "integer".to_string()),
//!             ("active".to_string(), "boolean".to_string()),
//!         ]
//!     }
//!
//!     fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
//!         vec![(
//!             "name".to_string(),
//!             AttributeConfig::new().column("first_name").column("last_name"),
//!         )]
//!     }
//! }
//!
//! let search = ModelSearch::new(Arc::new(Contacts));
//! let query = search
//!     .apply(SelectQuery::new("contacts"), "name=ann&active=1")
//!     .unwrap();
//!
//! assert_eq!(
//!     query.to_sql(),
//!     "SELECT * FROM \"contacts\" WHERE \
//!      (\"contacts\".\"first_name\" LIKE ?1 OR \"contacts\".\"last_name\" LIKE ?2) \
//!      AND (\"contacts\".\"active\" = ?3)"
//! );
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compiler;
pub mod config;
pub mod entity;
pub mod error;
pub mod normalizer;
pub mod operators;
pub mod planner;
pub mod query;
pub mod resolver;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{RelationStrategy, SearchConfig, ValueCombination};
pub use error::{ConfigurationError, SchemaError, SearchError, SearchResult};
pub use search::{ModelSearch, SearchPlan, SearchableAttribute, apply_search};
pub use types::{FilterType, SearchRequest};

// Re-export the entity traits
pub use entity::{
    AttributeConfig, ListLookupProvider, Relation, RelationKind, Schema, ScopeProvider,
    SearchEntity, ValueTransformer,
};

// Re-export the query builder
pub use query::{Condition, ConditionGroup, Join, JoinKind, SelectQuery, SqlParam};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
