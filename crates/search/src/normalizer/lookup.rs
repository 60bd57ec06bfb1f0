//! List-lookup filter handler.

use serde_json::Value;
use tracing::debug;

use super::{FilterMethod, is_blank, transform_value};
use crate::error::{ConfigurationError, SearchResult};
use crate::query::SqlParam;
use crate::resolver::AttributeDescriptor;

/// Resolves a value through the owning entity's list lookup.
pub struct ListLookupHandler;

impl ListLookupHandler {
    /// Compiles a lookup into an `IN` over the resolved values.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingLookup`] when the owning entity has no
    /// lookup for the attribute's source.
    pub fn compile(
        attribute: &AttributeDescriptor,
        value: &Value,
    ) -> SearchResult<Option<FilterMethod>> {
        let Some(source) = attribute.source.as_deref() else {
            debug!(field = %attribute.name, "List lookup attribute has no source");
            return Ok(None);
        };

        let value = transform_value(attribute, source, value);
        if is_blank(&value) {
            return Ok(None);
        }

        let provider = attribute
            .entity
            .list_lookup()
            .filter(|provider| provider.has_lookup(source))
            .ok_or_else(|| ConfigurationError::MissingLookup {
                entity: attribute.entity.table().to_string(),
                attribute: attribute.name.clone(),
                source_name: source.to_string(),
            })?;

        let Some(resolved) = provider.lookup(source, &value) else {
            debug!(field = %attribute.name, source = %source, "List lookup found nothing");
            return Ok(None);
        };

        Ok(Some(FilterMethod::In {
            values: resolved.iter().map(SqlParam::from_value).collect(),
            negated: false,
        }))
    }
}
