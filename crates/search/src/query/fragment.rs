//! SQL fragments and bound parameters.
//!
//! Every predicate the engine emits is rendered into a [`SqlFragment`]: SQL
//! text with numbered `?N` placeholders and the values bound to them. Values
//! never appear in the SQL text itself; only identifiers and fixed operator
//! keywords do.

use std::fmt;

use serde_json::Value;

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// The SQL text.
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Creates a float parameter.
    pub fn float(f: f64) -> Self {
        SqlParam::Float(f)
    }

    /// Converts a request value into a bound parameter.
    ///
    /// Booleans bind as `1`/`0`; arrays and objects bind as their JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Integer(i),
                None => n.as_f64().map(SqlParam::Float).unwrap_or(SqlParam::Null),
            },
            Value::String(s) => SqlParam::String(s.clone()),
            other => SqlParam::String(other.to_string()),
        }
    }
}

impl fmt::Display for SqlParam {
    /// Renders the parameter as a SQL literal, for debug output only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlParam::Integer(i) => write!(f, "{}", i),
            SqlParam::Float(x) => write!(f, "{}", x),
            SqlParam::Null => write!(f, "NULL"),
        }
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Adds a parameter placeholder and returns the placeholder string.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Appends raw SQL text.
    pub fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a bound parameter's placeholder to the SQL text.
    pub fn push_param(&mut self, param: SqlParam) {
        let placeholder = self.add_param(param);
        self.sql.push_str(&placeholder);
    }

    /// Appends SQL containing bare `?` placeholders, numbering them after the
    /// parameters already bound to this fragment.
    pub fn push_raw(&mut self, sql: &str, params: &[SqlParam]) {
        let mut remaining = params.iter();
        for c in sql.chars() {
            if c == '?' {
                if let Some(param) = remaining.next() {
                    self.push_param(param.clone());
                    continue;
                }
            }
            self.sql.push(c);
        }
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Returns the SQL with every `?N` placeholder replaced by its literal.
    ///
    /// Intended for logging and assertions; never execute the result.
    pub fn interpolated(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '?' {
                out.push(c);
                continue;
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            let param = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match param {
                Some(p) => out.push_str(&p.to_string()),
                None => {
                    out.push('?');
                    out.push_str(&digits);
                }
            }
        }

        out
    }
}

/// Quotes a (possibly qualified) identifier: `orders.total` → `"orders"."total"`.
///
/// Existing double quotes are stripped first; a `*` segment stays bare.
pub fn quote_identifier(identifier: &str) -> String {
    identifier
        .replace('"', "")
        .split('.')
        .map(|segment| {
            let segment = segment.trim();
            if segment == "*" {
                segment.to_string()
            } else {
                format!("\"{}\"", segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
