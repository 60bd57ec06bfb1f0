//! Assertion helpers for composed queries.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use helios_model_search::{ModelSearch, SelectQuery, SqlParam};

static ALIAS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"_[0-9a-f]{6}([".])"#).expect("alias token pattern"));

/// Applies `request` to a fresh query over the search's entity table.
pub fn apply(search: &ModelSearch, request: Value) -> SelectQuery {
    search
        .apply(SelectQuery::new(search.entity().table()), request)
        .expect("search should apply")
}

/// The WHERE clause of `query` with bindings interpolated, or `""` when
/// there is none.
pub fn where_clause(query: &SelectQuery) -> String {
    let sql = query.to_debug_sql();
    match sql.split_once(" WHERE ") {
        Some((_, clause)) => clause.to_string(),
        None => String::new(),
    }
}

/// Asserts the interpolated WHERE clause of applying `request`.
pub fn assert_where(search: &ModelSearch, request: Value, expected: &str) {
    let query = apply(search, request.clone());
    assert_eq!(
        where_clause(&query),
        expected,
        "Unexpected WHERE clause for request {}",
        request
    );
}

/// Asserts that applying `request` leaves the base query untouched.
pub fn assert_unfiltered(search: &ModelSearch, request: Value) {
    let query = apply(search, request.clone());
    assert_eq!(
        query.to_sql(),
        format!("SELECT * FROM \"{}\"", search.entity().table()),
        "Expected request {} to add nothing",
        request
    );
}

/// Asserts the bindings of `query`.
pub fn assert_bindings(query: &SelectQuery, expected: &[SqlParam]) {
    assert_eq!(query.bindings(), expected, "Binding mismatch for {}", query.to_sql());
}

/// Debug SQL with the random alias tokens replaced by `X`, so expectations
/// don't depend on them.
pub fn masked_sql(query: &SelectQuery) -> String {
    ALIAS_TOKEN
        .replace_all(&query.to_debug_sql(), "_X$1")
        .into_owned()
}
