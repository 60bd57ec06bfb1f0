//! Error types for model search.
//!
//! Search is lenient with request data: unknown fields, unsupported operators
//! and values that cannot be coerced are dropped, never reported. The errors
//! here cover what a caller has to fix: entity configuration and schema
//! documents.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Entity or engine configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Schema document errors
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors in how an entity or the engine is configured.
///
/// These are programming errors: retrying the same request cannot succeed.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A list-lookup attribute needs a lookup provider serving its source.
    #[error("entity '{entity}' has no list lookup for source '{source_name}' (attribute '{attribute}')")]
    MissingLookup {
        entity: String,
        attribute: String,
        source_name: String,
    },

    /// The engine configuration failed validation.
    #[error("invalid search configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

/// Errors loading a declarative entity schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema document could not be read.
    #[error("failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is not valid JSON for the schema format.
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    /// A relationship names an entity the schema does not define.
    #[error("relationship '{relationship}' on '{entity}' refers to unknown entity '{target}'")]
    UnknownEntity {
        entity: String,
        relationship: String,
        target: String,
    },

    /// The requested entity is not defined.
    #[error("entity not found in schema: {0}")]
    EntityNotFound(String),

    /// An entity definition is incomplete or inconsistent.
    #[error("invalid definition for entity '{entity}': {message}")]
    InvalidEntity { entity: String, message: String },
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
