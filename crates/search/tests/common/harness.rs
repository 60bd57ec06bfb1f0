//! In-memory SQLite database mirroring the fixture entities.

use rusqlite::Connection;

use helios_model_search::{SelectQuery, SqlParam};

const SCHEMA: &str = "
    CREATE TABLE other_mock_model (
        id INTEGER PRIMARY KEY,
        name TEXT,
        email TEXT
    );
    CREATE TABLE mock_model (
        id INTEGER PRIMARY KEY,
        is_enabled INTEGER NOT NULL DEFAULT 0,
        title TEXT,
        name TEXT,
        phone TEXT,
        total NUMERIC,
        owner_id INTEGER REFERENCES other_mock_model(id),
        published_at TEXT
    );
    CREATE TABLE tags (
        id INTEGER PRIMARY KEY,
        label TEXT
    );
    CREATE TABLE mock_model_tag (
        mock_model_id INTEGER REFERENCES mock_model(id),
        tag_id INTEGER REFERENCES tags(id)
    );
";

const SEED: &str = "
    INSERT INTO other_mock_model (id, name, email) VALUES
        (1, 'Alice', 'alice@example.com'),
        (2, 'Bob', 'bob@example.com');
    INSERT INTO mock_model (id, is_enabled, title, name, phone, total, owner_id, published_at) VALUES
        (1, 1, 'Test1', 'First', '0123 456 789', 10, 1, '2024-01-01'),
        (2, 0, 'Test2', 'Second', '555 0100', 25, 1, NULL),
        (3, 1, 'Other', 'Test3', NULL, 40, 2, '2024-02-01'),
        (4, 0, '', NULL, '999', 5, NULL, NULL);
    INSERT INTO tags (id, label) VALUES (1, 'red'), (2, 'blue');
    INSERT INTO mock_model_tag (mock_model_id, tag_id) VALUES
        (1, 1), (1, 2), (2, 2), (3, 1);
";

/// Opens a seeded in-memory database.
pub fn seeded_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open SQLite database");
    conn.execute_batch(SCHEMA).expect("Failed to create schema");
    conn.execute_batch(SEED).expect("Failed to seed data");
    conn
}

/// Runs `query` and returns the `id` column of every row, sorted.
pub fn fetch_ids(conn: &Connection, query: &SelectQuery) -> Vec<i64> {
    let fragment = query.build();
    let params_vec: Vec<Box<dyn rusqlite::ToSql>> =
        fragment.params.iter().map(to_sql_value).collect();
    let params_slice: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn
        .prepare(&fragment.sql)
        .unwrap_or_else(|e| panic!("Failed to prepare {}: {}", fragment.sql, e));
    let mut ids: Vec<i64> = stmt
        .query_map(params_slice.as_slice(), |row| row.get("id"))
        .expect("Failed to run query")
        .collect::<Result<_, _>>()
        .expect("Failed to read rows");
    ids.sort_unstable();
    ids
}

fn to_sql_value(param: &SqlParam) -> Box<dyn rusqlite::ToSql> {
    match param {
        SqlParam::String(s) => Box::new(s.clone()),
        SqlParam::Integer(i) => Box::new(*i),
        SqlParam::Float(f) => Box::new(*f),
        SqlParam::Null => Box::new(rusqlite::types::Null),
    }
}
