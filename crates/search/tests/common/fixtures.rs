//! Fixture entities.

use std::sync::Arc;

use serde_json::Value;

use helios_model_search::entity::{ListLookupProvider, Pivot, ScopeProvider, ValueTransformer};
use helios_model_search::query::ColumnRef;
use helios_model_search::{
    AttributeConfig, Condition, ConditionGroup, FilterType, ModelSearch, Relation, SearchConfig,
    SearchEntity, SqlParam,
};

/// The main fixture entity.
///
/// Casts: `id`, `is_enabled`, `title`, `name`, `phone`, `total`, `owner_id`.
/// Configured attributes:
/// - `lookup`: contains-search over `name` and `title`
/// - `phone`: wild-all search
/// - `status`: list lookup (`open`, `closed`, `none`)
/// - `published`: scope over `published_at`
pub struct MockModel;

impl SearchEntity for MockModel {
    fn table(&self) -> &str {
        "mock_model"
    }

    fn cast_fields(&self) -> Vec<(String, String)> {
        [
            ("id", "integer"),
            ("is_enabled", "boolean"),
            ("title", "string"),
            ("name", "string"),
            ("phone", "string"),
            ("total", "numeric"),
            ("owner_id", "integer"),
            ("published_at", "datetime"),
            ("meta", "array"),
        ]
        .into_iter()
        .map(|(name, cast)| (name.to_string(), cast.to_string()))
        .collect()
    }

    fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
        vec![
            (
                "lookup".to_string(),
                AttributeConfig::new()
                    .title("Name")
                    .column("mock_model.name")
                    .column("mock_model.title")
                    .filter(FilterType::String),
            ),
            (
                "phone".to_string(),
                AttributeConfig::new().column("mock_model.phone").wild_all(),
            ),
            (
                "status".to_string(),
                AttributeConfig::new()
                    .column("mock_model.id")
                    .filter(FilterType::ListLookup),
            ),
            (
                "published".to_string(),
                AttributeConfig::new().filter(FilterType::Scope),
            ),
        ]
    }

    fn search_relationships(&self) -> Vec<String> {
        vec!["owner".to_string(), "tags".to_string()]
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "owner" => Some(Relation::belongs_to(Arc::new(OtherMockModel), "owner_id", "id")),
            "tags" => Some(Relation::belongs_to_many(
                Arc::new(Tag),
                Pivot {
                    table: "mock_model_tag".to_string(),
                    foreign_pivot_key: "mock_model_id".to_string(),
                    related_pivot_key: "tag_id".to_string(),
                },
                "id",
                "id",
            )),
            _ => None,
        }
    }

    fn list_lookup(&self) -> Option<&dyn ListLookupProvider> {
        Some(self)
    }

    fn scopes(&self) -> Option<&dyn ScopeProvider> {
        Some(self)
    }

    fn value_transformer(&self) -> Option<&dyn ValueTransformer> {
        Some(self)
    }
}

impl ListLookupProvider for MockModel {
    fn has_lookup(&self, source: &str) -> bool {
        source == "status"
    }

    fn lookup(&self, _source: &str, value: &Value) -> Option<Vec<Value>> {
        match value.as_str()? {
            "open" => Some(vec![Value::from(1), Value::from(2)]),
            "closed" => Some(vec![Value::from(3)]),
            "none" => Some(Vec::new()),
            _ => None,
        }
    }
}

impl ScopeProvider for MockModel {
    fn has_scope(&self, source: &str) -> bool {
        source == "published"
    }

    fn apply_scope(&self, _source: &str, group: &mut ConditionGroup, value: &Value, positive: bool) {
        let published = !matches!(value, Value::Bool(false)) && value.as_str() != Some("0");
        group.and(Condition::null(
            ColumnRef::named("mock_model.published_at"),
            published == positive,
        ));
    }
}

impl ValueTransformer for MockModel {
    fn transform(&self, source: &str, value: &Value) -> Option<Value> {
        match (source, value) {
            ("status", Value::String(text)) => Some(Value::String(text.trim().to_lowercase())),
            _ => None,
        }
    }
}

/// Owner of `mock_model` rows.
///
/// Configured attributes:
/// - `contact`: raw expression over `name` and `email`
/// - `domain`: scope matching the e-mail domain with a raw condition
pub struct OtherMockModel;

impl SearchEntity for OtherMockModel {
    fn table(&self) -> &str {
        "other_mock_model"
    }

    fn cast_fields(&self) -> Vec<(String, String)> {
        vec![
            ("id".to_string(), "integer".to_string()),
            ("name".to_string(), "string".to_string()),
            ("email".to_string(), "string".to_string()),
        ]
    }

    fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
        vec![
            (
                "contact".to_string(),
                AttributeConfig::new()
                    .column("#other_mock_model.name || ' ' || other_mock_model.email"),
            ),
            (
                "domain".to_string(),
                AttributeConfig::new().filter(FilterType::Scope),
            ),
        ]
    }

    fn search_relationships(&self) -> Vec<String> {
        vec!["mocks".to_string()]
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        (name == "mocks").then(|| Relation::has_many(Arc::new(MockModel), "owner_id", "id"))
    }

    fn scopes(&self) -> Option<&dyn ScopeProvider> {
        Some(self)
    }
}

impl ScopeProvider for OtherMockModel {
    fn has_scope(&self, source: &str) -> bool {
        source == "domain"
    }

    fn apply_scope(&self, _source: &str, group: &mut ConditionGroup, value: &Value, positive: bool) {
        let Some(domain) = value.as_str() else {
            return;
        };
        let sql = if positive {
            "other_mock_model.email LIKE ?"
        } else {
            "other_mock_model.email NOT LIKE ?"
        };
        group.and(Condition::raw(sql, vec![SqlParam::string(format!("%@{}", domain))]));
    }
}

/// Tags attached to `mock_model` rows through `mock_model_tag`.
pub struct Tag;

impl SearchEntity for Tag {
    fn table(&self) -> &str {
        "tags"
    }

    fn cast_fields(&self) -> Vec<(String, String)> {
        vec![
            ("id".to_string(), "integer".to_string()),
            ("label".to_string(), "string".to_string()),
        ]
    }
}

/// Search over [`MockModel`] with the default configuration.
pub fn mock_search() -> ModelSearch {
    ModelSearch::new(Arc::new(MockModel))
}

/// Search over [`MockModel`] with `config`.
pub fn mock_search_with(config: SearchConfig) -> ModelSearch {
    ModelSearch::new(Arc::new(MockModel)).with_config(config)
}

/// Search over [`OtherMockModel`].
pub fn owner_search() -> ModelSearch {
    ModelSearch::new(Arc::new(OtherMockModel))
}
