//! Scope filter handler.

use serde_json::Value;
use tracing::debug;

use super::{FilterMethod, transform_value};
use crate::resolver::AttributeDescriptor;

/// Routes a filter to a named scope of the owning entity.
pub struct ScopeHandler;

impl ScopeHandler {
    /// Compiles a scope invocation, or drops the filter when the entity has
    /// no scope named after the attribute's source.
    pub fn compile(attribute: &AttributeDescriptor, value: &Value) -> Option<FilterMethod> {
        let source = attribute.source.as_deref()?;
        let value = transform_value(attribute, source, value);

        let has_scope = attribute
            .entity
            .scopes()
            .is_some_and(|scopes| scopes.has_scope(source));
        if !has_scope {
            debug!(field = %attribute.name, source = %source, "Entity has no such scope");
            return None;
        }

        Some(FilterMethod::Scope {
            source: source.to_string(),
            value,
        })
    }
}
