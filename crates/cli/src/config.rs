//! Command line configuration for `model-search`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MODEL_SEARCH_SCHEMA` | - | Path of the JSON entity schema |
//! | `MODEL_SEARCH_ENTITY` | - | Entity to search |
//! | `MODEL_SEARCH_REQUEST` | stdin | Search request (JSON or URL query text) |
//! | `MODEL_SEARCH_OUTPUT` | sql | Output: sql, bindings, debug, json, attributes, operators |
//! | `MODEL_SEARCH_LOG_LEVEL` | warn | Log level |
//! | `MODEL_SEARCH_RELATION_STRATEGY` | join | join or exists |
//! | `MODEL_SEARCH_VALUE_COMBINATION` | all | all or any |
//! | `MODEL_SEARCH_JOIN_TYPE` | left | left or inner |
//! | `MODEL_SEARCH_PATH_SEPARATOR` | - | Separator accepted in place of `.` |
//! | `MODEL_SEARCH_ALIAS_TOKEN_LENGTH` | 6 | Hex characters in join aliases |
//! | `MODEL_SEARCH_DISTINCT_ON_JOIN` | true | Project `DISTINCT key, table.*` when joining |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use helios_model_search::{JoinKind, RelationStrategy, SearchConfig, ValueCombination};

/// What `model-search` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// SQL with `?N` placeholders.
    Sql,
    /// One binding per line.
    Bindings,
    /// SQL with bindings interpolated.
    Debug,
    /// `{"sql": ..., "bindings": [...]}`
    Json,
    /// The entity's searchable attributes.
    Attributes,
    /// The operator catalog.
    Operators,
}

impl OutputFormat {
    /// True if the format needs a schema and entity.
    pub fn needs_entity(&self) -> bool {
        !matches!(self, OutputFormat::Operators)
    }

    /// True if the format needs a request.
    pub fn needs_request(&self) -> bool {
        matches!(
            self,
            OutputFormat::Sql | OutputFormat::Bindings | OutputFormat::Debug | OutputFormat::Json
        )
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Sql => write!(f, "sql"),
            OutputFormat::Bindings => write!(f, "bindings"),
            OutputFormat::Debug => write!(f, "debug"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Attributes => write!(f, "attributes"),
            OutputFormat::Operators => write!(f, "operators"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql" => Ok(OutputFormat::Sql),
            "bindings" => Ok(OutputFormat::Bindings),
            "debug" => Ok(OutputFormat::Debug),
            "json" => Ok(OutputFormat::Json),
            "attributes" => Ok(OutputFormat::Attributes),
            "operators" => Ok(OutputFormat::Operators),
            _ => Err(format!(
                "Invalid output format '{}'. Valid values: sql, bindings, debug, json, attributes, operators",
                s
            )),
        }
    }
}

/// Configuration for the `model-search` command.
#[derive(Debug, Clone, Parser)]
#[command(name = "model-search")]
#[command(about = "Compose SQL for a model search request")]
pub struct CliConfig {
    /// Path of the JSON entity schema.
    #[arg(short, long, env = "MODEL_SEARCH_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Entity to search.
    #[arg(short, long, env = "MODEL_SEARCH_ENTITY")]
    pub entity: Option<String>,

    /// Search request as JSON or URL query text; read from stdin when absent.
    #[arg(short, long, env = "MODEL_SEARCH_REQUEST")]
    pub request: Option<String>,

    /// Output format (sql, bindings, debug, json, attributes, operators).
    #[arg(short, long, env = "MODEL_SEARCH_OUTPUT", default_value = "sql")]
    pub output: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "MODEL_SEARCH_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// How relationship filters are applied (join, exists).
    #[arg(long, env = "MODEL_SEARCH_RELATION_STRATEGY", default_value = "join")]
    pub relation_strategy: String,

    /// How several filters on one field combine (all, any).
    #[arg(long, env = "MODEL_SEARCH_VALUE_COMBINATION", default_value = "all")]
    pub value_combination: String,

    /// Join type for relationship joins (left, inner).
    #[arg(long, env = "MODEL_SEARCH_JOIN_TYPE", default_value = "left")]
    pub join_type: String,

    /// Separator accepted in place of `.` in relationship field names.
    #[arg(long, env = "MODEL_SEARCH_PATH_SEPARATOR", default_value = "-")]
    pub path_separator: String,

    /// Number of hex characters in join alias tokens.
    #[arg(long, env = "MODEL_SEARCH_ALIAS_TOKEN_LENGTH", default_value = "6")]
    pub alias_token_length: usize,

    /// Project `DISTINCT key, table.*` when joins are added.
    #[arg(long, env = "MODEL_SEARCH_DISTINCT_ON_JOIN", default_value = "true", action = clap::ArgAction::Set)]
    pub distinct_on_join: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            schema: None,
            entity: None,
            request: None,
            output: "sql".to_string(),
            log_level: "warn".to_string(),
            relation_strategy: "join".to_string(),
            value_combination: "all".to_string(),
            join_type: "left".to_string(),
            path_separator: "-".to_string(),
            alias_token_length: 6,
            distinct_on_join: true,
        }
    }
}

impl CliConfig {
    /// Parses the output format.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Builds the search configuration from the command line settings.
    pub fn search_config(&self) -> Result<SearchConfig, String> {
        Ok(SearchConfig {
            path_separator: self.path_separator.clone(),
            relation_strategy: self.relation_strategy.parse::<RelationStrategy>()?,
            value_combination: self.value_combination.parse::<ValueCombination>()?,
            join_type: self.join_type.parse::<JoinKind>()?,
            alias_token_length: self.alias_token_length,
            distinct_on_join: self.distinct_on_join,
        })
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.output_format() {
            Ok(format) if format.needs_entity() => {
                if self.schema.is_none() {
                    errors.push(format!("Output '{}' requires --schema", format));
                }
                if self.entity.is_none() {
                    errors.push(format!("Output '{}' requires --entity", format));
                }
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }

        match self.search_config() {
            Ok(config) => {
                if let Err(config_errors) = config.validate() {
                    errors.extend(config_errors);
                }
            }
            Err(e) => errors.push(e),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing(schema: impl Into<PathBuf>, entity: &str) -> Self {
        Self {
            schema: Some(schema.into()),
            entity: Some(entity.to_string()),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }
}
