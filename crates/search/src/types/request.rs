//! Raw search requests.
//!
//! A request maps field names to filter expressions. It arrives in one of
//! three shapes, all of which decode to the same [`SearchRequest`]:
//!
//! - a native map (`serde_json::Value::Object`)
//! - JSON text: `{"title": "Test"}`
//! - URL query text: `title=Test`, with PHP-style brackets for nesting
//!   (`title[]=a&title[]=b`, `title[0][]==&title[0][]=Test`)
//!
//! Malformed input never fails; whatever cannot be decoded is dropped.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// A decoded search request: field name → raw filter expression.
///
/// Field order is the order fields appeared in the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchRequest {
    fields: Map<String, Value>,
}

impl SearchRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a request given as a native map or as JSON / URL query text.
    pub fn parse(raw: &Value) -> Self {
        match raw {
            Value::Object(map) => Self { fields: map.clone() },
            Value::String(text) => Self::parse_str(text),
            Value::Null => Self::new(),
            other => {
                debug!(kind = %value_kind(other), "Ignoring search request that is not a map");
                Self::new()
            }
        }
    }

    /// Decodes JSON or URL query text.
    pub fn parse_str(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::new();
        }

        if text.starts_with('{') || text.starts_with('[') {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(fields)) => return Self { fields },
                Ok(other) => {
                    debug!(kind = %value_kind(&other), "Ignoring JSON search request that is not an object");
                    return Self::new();
                }
                Err(e) => {
                    debug!(error = %e, "Search request is not JSON, decoding as a query string");
                }
            }
        }

        Self {
            fields: parse_query(text),
        }
    }

    /// Adds a field, merging with any filters already present for it.
    pub fn insert(&mut self, field: impl Into<String>, filters: Value) {
        let field = field.into();
        match self.fields.remove(&field) {
            Some(existing) => {
                self.fields.insert(field, merge_filters(existing, filters));
            }
            None => {
                self.fields.insert(field, filters);
            }
        }
    }

    /// Rewrites `relationship<separator>attribute` field names to
    /// `relationship.attribute`.
    ///
    /// A separator is rewritten only where the text before it names a
    /// relationship, so own fields such as `first-name` keep their spelling.
    /// Names that already contain a `.` are left alone.
    pub fn canonicalize(self, separator: &str, is_relationship: impl Fn(&str) -> bool) -> Self {
        if separator.is_empty() || separator == "." {
            return self;
        }

        let mut out = SearchRequest::new();
        for (field, filters) in self.fields {
            let split = if field.contains('.') {
                None
            } else {
                field
                    .match_indices(separator)
                    .map(|(at, _)| at)
                    .find(|at| is_relationship(&field[..*at]))
            };
            let canonical = match split {
                Some(at) => format!("{}.{}", &field[..at], &field[at + separator.len()..]),
                None => field,
            };
            out.insert(canonical, filters);
        }
        out
    }

    /// Iterates fields in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns the filters for a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the request names no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for SearchRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<&str> for SearchRequest {
    fn from(text: &str) -> Self {
        Self::parse_str(text)
    }
}

impl From<Value> for SearchRequest {
    fn from(raw: Value) -> Self {
        Self::parse(&raw)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Combines two filter expressions for one field into a list of filters.
fn merge_filters(existing: Value, incoming: Value) -> Value {
    let mut merged = match existing {
        Value::Array(items) => items,
        other => vec![other],
    };
    match incoming {
        Value::Array(items) => merged.extend(items),
        other => merged.push(other),
    }
    Value::Array(merged)
}

/// Decodes `a=1&b[]=2&b[]=3&c[0][]==&c[0][]=x` into nested JSON.
fn parse_query(text: &str) -> Map<String, Value> {
    let text = text.strip_prefix('?').unwrap_or(text);
    let mut root = Map::new();

    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        let (base, path) = split_key(&key);
        if base.is_empty() {
            continue;
        }
        insert_path(&mut root, base, &path, value.into_owned());
    }

    root.into_iter().map(|(k, v)| (k, listify(v))).collect()
}

/// Splits `title[0][]` into `("title", ["0", ""])`.
fn split_key(key: &str) -> (&str, Vec<String>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };

    let base = &key[..open];
    let mut path = Vec::new();
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            // Unbalanced bracket: treat the whole key as a plain name.
            return (key, Vec::new());
        };
        path.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }

    (base, path)
}

fn next_index(map: &Map<String, Value>) -> String {
    map.keys()
        .filter_map(|k| k.parse::<usize>().ok())
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
        .to_string()
}

fn insert_path(node: &mut Map<String, Value>, key: &str, path: &[String], value: String) {
    let key = if key.is_empty() {
        next_index(node)
    } else {
        key.to_string()
    };

    let Some((next, rest)) = path.split_first() else {
        node.insert(key, Value::String(value));
        return;
    };

    let child = node
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        insert_path(map, next, rest, value);
    }
}

/// Turns objects keyed only by integers into arrays, recursively.
fn listify(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sequential = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
            if sequential {
                let mut entries: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, listify(v))))
                    .collect();
                entries.sort_by_key(|(i, _)| *i);
                Value::Array(entries.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, listify(v))).collect())
            }
        }
        other => other,
    }
}
