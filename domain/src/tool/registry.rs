//! Tool registry and parameter contract
//!
//! The registry is an explicitly constructed value injected into the
//! dispatcher. It holds every [`ToolDescriptor`] for the lifetime of the
//! process and enforces one parameter contract per capability.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::coerce::coerce;
use super::entities::ToolDescriptor;
use super::value_objects::ToolError;
use crate::core::error::DomainError;

/// Catalog of tool descriptors with alias resolution.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    /// Registration order, for stable listings in prompts
    order: Vec<String>,
    /// Alias → canonical name mapping (e.g. "scan" → "scan_all")
    aliases: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Re-registering an identical shape is a no-op; a different shape under
    /// the same name is rejected.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), DomainError> {
        descriptor.check()?;
        if let Some(existing) = self.tools.get(&descriptor.name) {
            if existing.same_shape(&descriptor) {
                return Ok(());
            }
            return Err(DomainError::ConflictingRegistration(descriptor.name));
        }
        self.order.push(descriptor.name.clone());
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Register a single alias mapping
    pub fn register_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Resolve a name: canonical names win over aliases
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.aliases
                .get(name)
                .map(|s| s.as_str())
                .filter(|canonical| self.tools.contains_key(*canonical))
        }
    }

    /// Look up a descriptor by canonical name or alias.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.resolve(name).and_then(|canonical| self.tools.get(canonical))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Validate `raw` against the contract of `name` and return coerced args.
    ///
    /// - absent optional parameters receive their declared default
    /// - a missing required parameter fails naming it
    /// - values are coerced to the declared type, or fail naming the
    ///   parameter and the expected type
    /// - keys the contract does not declare pass through unchanged
    pub fn validate_and_coerce(
        &self,
        name: &str,
        raw: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ToolError> {
        let descriptor = self.lookup(name).ok_or_else(|| ToolError::unknown_tool(name))?;

        let mut coerced = Map::new();
        for param in &descriptor.parameters {
            match raw.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let converted = coerce(value, param.param_type).ok_or_else(|| {
                        ToolError::invalid_parameter(&param.name, param.param_type, value)
                    })?;
                    coerced.insert(param.name.clone(), converted);
                }
                None if param.required => {
                    return Err(ToolError::missing_parameter(&descriptor.name, &param.name));
                }
                None => {
                    if let Some(default) = &param.default {
                        coerced.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        for (key, value) in raw {
            if descriptor.parameter(key).is_none() {
                coerced.insert(key.clone(), value.clone());
            }
        }

        Ok(coerced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ParameterSpec, ToolCategory};
    use crate::tool::value_objects::ErrorKind;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
                    .with_parameter(ParameterSpec::required("address", ParamType::Integer))
                    .with_parameter(ParameterSpec::required("size", ParamType::Integer)),
            )
            .unwrap();
        registry
            .register(
                ToolDescriptor::new("read_string", ToolCategory::MemoryRead)
                    .with_parameter(ParameterSpec::required("address", ParamType::Integer))
                    .with_parameter(ParameterSpec::with_default("max_length", ParamType::Integer, 256))
                    .with_parameter(ParameterSpec::with_default("wide", ParamType::Boolean, false)),
            )
            .unwrap();
        registry
            .register(
                ToolDescriptor::new("set_breakpoint", ToolCategory::Breakpoint)
                    .with_parameter(ParameterSpec::required("address", ParamType::Integer))
                    .with_parameter(ParameterSpec::optional("id", ParamType::String)),
            )
            .unwrap();
        registry.register_alias("read", "read_memory");
        registry
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let err = registry()
            .validate_and_coerce("read_memory", &args(json!({"size": "16"})))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParameterError);
        assert_eq!(err.parameter.as_deref(), Some("address"));
        assert!(err.message.contains("address"));
    }

    #[test]
    fn test_hex_and_decimal_text_coerced() {
        let coerced = registry()
            .validate_and_coerce("read_memory", &args(json!({"address": "0x1000", "size": "16"})))
            .unwrap();
        assert_eq!(Value::Object(coerced), json!({"address": 4096, "size": 16}));
    }

    #[test]
    fn test_defaults_filled_and_bool_coerced() {
        let coerced = registry()
            .validate_and_coerce("read_string", &args(json!({"address": 16, "wide": "yes"})))
            .unwrap();
        assert_eq!(
            Value::Object(coerced),
            json!({"address": 16, "max_length": 256, "wide": true})
        );
    }

    #[test]
    fn test_optional_without_default_is_omitted() {
        let coerced = registry()
            .validate_and_coerce("set_breakpoint", &args(json!({"address": "0x10"})))
            .unwrap();
        assert!(!coerced.contains_key("id"));
    }

    #[test]
    fn test_uncoercible_value_names_parameter_and_type() {
        let err = registry()
            .validate_and_coerce("read_memory", &args(json!({"address": "here", "size": 4})))
            .unwrap_err();
        assert_eq!(err.parameter.as_deref(), Some("address"));
        assert!(err.message.contains("integer"));
    }

    #[test]
    fn test_hex_letter_word_is_parameter_error() {
        let err = registry()
            .validate_and_coerce("read_memory", &args(json!({"address": "add", "size": 4})))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParameterError);
        assert_eq!(err.parameter.as_deref(), Some("address"));
    }

    #[test]
    fn test_null_required_counts_as_missing() {
        let err = registry()
            .validate_and_coerce("read_memory", &args(json!({"address": null, "size": 4})))
            .unwrap_err();
        assert_eq!(err.parameter.as_deref(), Some("address"));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let coerced = registry()
            .validate_and_coerce(
                "read_memory",
                &args(json!({"address": 1, "size": 2, "comment": "x", "extra": [1]})),
            )
            .unwrap();
        assert_eq!(coerced["comment"], "x");
        assert_eq!(coerced["extra"], json!([1]));
    }

    #[test]
    fn test_unknown_tool_is_parameter_error() {
        let err = registry()
            .validate_and_coerce("write_memory", &Map::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParameterError);
        assert!(err.message.contains("write_memory"));
    }

    #[test]
    fn test_alias_resolution() {
        let registry = registry();
        assert_eq!(registry.lookup("read").map(|d| d.name.as_str()), Some("read_memory"));
        assert!(
            registry
                .validate_and_coerce("read", &args(json!({"address": 1, "size": 1})))
                .is_ok()
        );
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_identical_reregistration_is_accepted() {
        let mut registry = registry();
        let same = ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
            .describe("duplicate registration")
            .with_parameter(ParameterSpec::required("address", ParamType::Integer))
            .with_parameter(ParameterSpec::required("size", ParamType::Integer));
        assert!(registry.register(same).is_ok());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_conflicting_registration_rejected() {
        let mut registry = registry();
        let conflicting = ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
            .with_parameter(ParameterSpec::required("address", ParamType::String));
        assert_eq!(
            registry.register(conflicting),
            Err(DomainError::ConflictingRegistration("read_memory".to_string()))
        );
    }

    #[test]
    fn test_listing_keeps_registration_order() {
        let registry = registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["read_memory", "read_string", "set_breakpoint"]);
    }
}
