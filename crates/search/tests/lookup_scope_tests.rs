//! List-lookup and scope integration tests.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use helios_model_search::{
    AttributeConfig, ConfigurationError, FilterType, ModelSearch, SearchEntity, SearchError,
    SelectQuery,
};

// ============================================================================
// List lookup
// ============================================================================

#[test]
fn test_lookup_resolves_to_membership() {
    let search = mock_search();
    assert_where(
        &search,
        json!({"status": "open"}),
        "(\"mock_model\".\"id\" IN (1, 2))",
    );
    // Transformed before lookup
    assert_where(
        &search,
        json!({"status": " OPEN "}),
        "(\"mock_model\".\"id\" IN (1, 2))",
    );
}

#[test]
fn test_lookup_empty_result_matches_nothing() {
    assert_where(&mock_search(), json!({"status": "none"}), "(0 = 1)");
}

#[test]
fn test_lookup_failure_drops_filter() {
    let search = mock_search();
    assert_unfiltered(&search, json!({"status": "unknown"}));
    assert_unfiltered(&search, json!({"status": ""}));
}

struct Unwired;

impl SearchEntity for Unwired {
    fn table(&self) -> &str {
        "unwired"
    }

    fn cast_fields(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
        vec![(
            "kind".to_string(),
            AttributeConfig::new().filter(FilterType::ListLookup),
        )]
    }
}

#[test]
fn test_missing_lookup_is_a_configuration_error() {
    let search = ModelSearch::new(Arc::new(Unwired));
    let err = search
        .apply(SelectQuery::new("unwired"), json!({"kind": "a"}))
        .unwrap_err();
    match err {
        SearchError::Configuration(ConfigurationError::MissingLookup {
            entity,
            attribute,
            source_name,
        }) => {
            assert_eq!(entity, "unwired");
            assert_eq!(attribute, "kind");
            assert_eq!(source_name, "kind");
        }
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_scope_applied() {
    let search = mock_search();
    assert_where(
        &search,
        json!({"published": "1"}),
        "(\"mock_model\".\"published_at\" IS NOT NULL)",
    );
    assert_where(
        &search,
        json!({"published": "0"}),
        "(\"mock_model\".\"published_at\" IS NULL)",
    );
}

#[test]
fn test_negated_scope() {
    assert_where(
        &mock_search(),
        json!({"published": [["!=", "1"]]}),
        "(\"mock_model\".\"published_at\" IS NULL)",
    );
}

#[test]
fn test_multiple_scope_values_are_anded() {
    assert_where(
        &mock_search(),
        json!({"published": ["1", "0"]}),
        "(\"mock_model\".\"published_at\" IS NOT NULL) AND (\"mock_model\".\"published_at\" IS NULL)",
    );
}

#[test]
fn test_scope_receives_sentinel_values_verbatim() {
    for sentinel in ["NULL", "NOT_NULL", "EMPTY", "NOT_EMPTY"] {
        assert_where(
            &owner_search(),
            json!({"domain": sentinel}),
            &format!("(other_mock_model.email LIKE '%@{}')", sentinel),
        );
    }
}

#[test]
fn test_missing_scope_drops_filter() {
    struct NoScopes;

    impl SearchEntity for NoScopes {
        fn table(&self) -> &str {
            "no_scopes"
        }

        fn cast_fields(&self) -> Vec<(String, String)> {
            Vec::new()
        }

        fn search_attributes(&self) -> Vec<(String, AttributeConfig)> {
            vec![(
                "recent".to_string(),
                AttributeConfig::new().filter(FilterType::Scope),
            )]
        }
    }

    assert_unfiltered(&ModelSearch::new(Arc::new(NoScopes)), json!({"recent": "1"}));
}
