//! Executes composed queries against an in-memory SQLite database.

mod common;

use serde_json::json;

use common::*;
use helios_model_search::{ModelSearch, RelationStrategy, SearchConfig, SelectQuery};

fn ids(search: &ModelSearch, request: serde_json::Value) -> Vec<i64> {
    let conn = seeded_db();
    let query = search
        .apply(SelectQuery::new(search.entity().table()), request)
        .expect("search should apply");
    fetch_ids(&conn, &query)
}

// ============================================================================
// Own attributes
// ============================================================================

#[test]
fn test_unfiltered_returns_everything() {
    assert_eq!(ids(&mock_search(), json!({})), vec![1, 2, 3, 4]);
}

#[test]
fn test_contains_across_columns() {
    assert_eq!(ids(&mock_search(), json!({"lookup": "Test"})), vec![1, 2, 3]);
}

#[test]
fn test_does_not_contain() {
    assert_eq!(
        ids(&mock_search(), json!({"title": [["*!=*", "Test"]]})),
        vec![3, 4]
    );
}

#[test]
fn test_boolean() {
    assert_eq!(ids(&mock_search(), json!({"is_enabled": true})), vec![1, 3]);
    assert_eq!(ids(&mock_search(), json!({"is_enabled": "0"})), vec![2, 4]);
}

#[test]
fn test_number_ranges() {
    let search = mock_search();
    assert_eq!(ids(&search, json!({"total": "10><30"})), vec![1, 2]);
    assert_eq!(ids(&search, json!({"total": [[">", 5], ["<", 30]]})), vec![1, 2]);
    assert_eq!(ids(&search, json!({"total": ">= 25"})), vec![2, 3]);
}

#[test]
fn test_wild_all_phone() {
    assert_eq!(ids(&mock_search(), json!({"phone": "0456"})), vec![1]);
}

#[test]
fn test_presence() {
    let search = mock_search();
    assert_eq!(ids(&search, json!({"title": "EMPTY"})), vec![4]);
    assert_eq!(ids(&search, json!({"name": "NULL"})), vec![4]);
    assert_eq!(ids(&search, json!({"phone": "NOT_NULL"})), vec![1, 2, 4]);
}

#[test]
fn test_lookup_and_scope() {
    let search = mock_search();
    assert_eq!(ids(&search, json!({"status": "open"})), vec![1, 2]);
    assert!(ids(&search, json!({"status": "none"})).is_empty());
    assert_eq!(ids(&search, json!({"published": "1"})), vec![1, 3]);
    assert_eq!(ids(&search, json!({"published": [["!=", "1"]]})), vec![2, 4]);
}

// ============================================================================
// Relationships
// ============================================================================

#[test]
fn test_belongs_to() {
    let search = mock_search();
    assert_eq!(ids(&search, json!({"owner.name": "ali"})), vec![1, 2]);
    assert_eq!(
        ids(&search, json!({"is_enabled": true, "owner-name": "alice"})),
        vec![1]
    );
}

#[test]
fn test_belongs_to_many_is_distinct() {
    let search = mock_search();
    assert_eq!(ids(&search, json!({"tags.label": "red"})), vec![1, 3]);
    assert_eq!(
        ids(&search, json!({"tags.label": [["IN", "red;blue"]]})),
        vec![1, 2, 3]
    );
}

#[test]
fn test_has_many() {
    assert_eq!(ids(&owner_search(), json!({"mocks.title": "Test"})), vec![1]);
    assert_eq!(ids(&owner_search(), json!({"mocks.total": [[">", 30]]})), vec![2]);
}

#[test]
fn test_exists_strategy_matches_join_strategy() {
    let joins = mock_search();
    let exists = mock_search_with(
        SearchConfig::default().with_relation_strategy(RelationStrategy::Exists),
    );
    for request in [
        json!({"owner.name": "bob"}),
        json!({"tags.label": [["IN", "red;blue"]]}),
        json!({"title": "Test", "tags.label": "blue"}),
    ] {
        assert_eq!(ids(&joins, request.clone()), ids(&exists, request));
    }
}

// ============================================================================
// Raw expressions on related entities
// ============================================================================

fn both_strategies() -> [ModelSearch; 2] {
    [
        mock_search(),
        mock_search_with(SearchConfig::default().with_relation_strategy(RelationStrategy::Exists)),
    ]
}

#[test]
fn test_related_raw_expression_column() {
    for search in both_strategies() {
        assert_eq!(ids(&search, json!({"owner.contact": "Alice"})), vec![1, 2]);
        assert_eq!(ids(&search, json!({"owner.contact": "bob@"})), vec![3]);
        assert_eq!(
            ids(&search, json!({"owner.contact": [["*!=*", "alice"]]})),
            vec![3]
        );
        assert_eq!(ids(&search, json!({"owner.contact": "NOT_EMPTY"})), vec![1, 2, 3]);
    }
}

#[test]
fn test_related_scope_with_raw_condition() {
    for search in both_strategies() {
        assert_eq!(
            ids(&search, json!({"owner.domain": "example.com"})),
            vec![1, 2, 3]
        );
        assert!(ids(&search, json!({"owner.domain": "example.org"})).is_empty());
    }
}
