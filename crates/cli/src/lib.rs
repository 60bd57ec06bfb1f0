//! Command line front end for `helios-model-search`.
//!
//! Loads a JSON entity schema, applies a search request to the chosen entity
//! and prints the composed query in one of several formats.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use helios_model_search::operators;
use helios_model_search::{FilterType, ModelSearch, Schema, SelectQuery, SqlParam};
use serde_json::{Value, json};
use tracing::debug;

pub mod config;

pub use config::{CliConfig, OutputFormat};

/// Initializes logging to stderr, so that stdout carries only the output.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_model_search={level},helios_model_search_cli={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Runs one invocation and returns the text to print.
///
/// `request` is only consulted by the query output formats.
pub fn run(config: &CliConfig, request: &str) -> anyhow::Result<String> {
    let format = config.output_format().map_err(|e| anyhow!(e))?;

    if format == OutputFormat::Operators {
        return Ok(serde_json::to_string_pretty(&operator_catalog())?);
    }

    let search = load_search(config)?;

    if format == OutputFormat::Attributes {
        return Ok(serde_json::to_string_pretty(
            &search.searchable_attributes(),
        )?);
    }

    let table = search.entity().table().to_string();
    let query = search.apply(SelectQuery::new(&table), request)?;
    debug!(table = %table, bindings = query.bindings().len(), "Composed query");

    let output = match format {
        OutputFormat::Sql => query.to_sql(),
        OutputFormat::Debug => query.to_debug_sql(),
        OutputFormat::Bindings => query
            .bindings()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let fragment = query.build();
            let bindings: Vec<Value> = fragment.params.iter().map(param_to_json).collect();
            serde_json::to_string_pretty(&json!({
                "sql": fragment.sql,
                "bindings": bindings,
            }))?
        }
        OutputFormat::Attributes | OutputFormat::Operators => unreachable!("handled above"),
    };
    Ok(output)
}

fn load_search(config: &CliConfig) -> anyhow::Result<ModelSearch> {
    let path = config
        .schema
        .as_ref()
        .ok_or_else(|| anyhow!("no schema given"))?;
    let name = config
        .entity
        .as_deref()
        .ok_or_else(|| anyhow!("no entity given"))?;

    let schema = Schema::from_path(path)
        .with_context(|| format!("loading schema {}", path.display()))?;
    let entity = Arc::new(schema).entity(name)?;
    let search_config = config.search_config().map_err(|e| anyhow!(e))?;

    Ok(ModelSearch::new(entity).with_config(search_config))
}

fn operator_catalog() -> Value {
    let mut catalog = serde_json::Map::new();
    for filter_type in FilterType::ALL {
        catalog.insert(
            filter_type.as_str().to_string(),
            json!({
                "default": filter_type.default_operator(),
                "operators": operators::operators(filter_type),
            }),
        );
    }
    Value::Object(catalog)
}

fn param_to_json(param: &SqlParam) -> Value {
    match param {
        SqlParam::String(s) => Value::String(s.clone()),
        SqlParam::Integer(i) => json!(i),
        SqlParam::Float(f) => json!(f),
        SqlParam::Null => Value::Null,
    }
}
