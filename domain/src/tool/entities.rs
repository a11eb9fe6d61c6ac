//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::DomainError;

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    String,
    Boolean,
    List,
    Mapping,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::List => "list",
            ParamType::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Functional grouping of bridge commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Basic,
    MemoryRead,
    PatternScan,
    Debug,
    Breakpoint,
    Dbvm,
    Process,
    Other,
}

impl ToolCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ToolCategory::Basic => "basic",
            ToolCategory::MemoryRead => "memory_read",
            ToolCategory::PatternScan => "pattern_scan",
            ToolCategory::Debug => "debug",
            ToolCategory::Breakpoint => "breakpoint",
            ToolCategory::Dbvm => "dbvm",
            ToolCategory::Process => "process",
            ToolCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timeout class of a tool; the concrete duration is configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    /// Liveness and listing calls.
    Quick,
    /// Ordinary reads and analysis.
    #[default]
    Standard,
    /// Whole-address-space scans.
    Scan,
}

impl TimeoutClass {
    pub fn as_str(&self) -> &str {
        match self {
            TimeoutClass::Quick => "quick",
            TimeoutClass::Standard => "standard",
            TimeoutClass::Scan => "scan",
        }
    }
}

impl std::fmt::Display for TimeoutClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a tool.
///
/// A required parameter never carries a default; [`ToolDescriptor::check`]
/// enforces this at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParameterSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            description: String::new(),
        }
    }

    /// An optional parameter without a default; omitted from the call when absent.
    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: None,
            description: String::new(),
        }
    }

    /// An optional parameter filled with `default` when absent.
    pub fn with_default(
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: Some(default.into()),
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Shape equality: everything except the free-text description.
    fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.param_type == other.param_type
            && self.required == other.required
            && self.default == other.default
    }
}

/// Immutable description of a remote capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name, also the RPC method name
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub category: ToolCategory,
    /// Ordered parameter contract
    pub parameters: Vec<ParameterSpec>,
    pub timeout_class: TimeoutClass,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, category: ToolCategory) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            parameters: Vec::new(),
            timeout_class: TimeoutClass::Standard,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_timeout_class(mut self, class: TimeoutClass) -> Self {
        self.timeout_class = class;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Two descriptors conflict when they share a name but differ in
    /// category, timeout class, or any parameter's shape.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.category == other.category
            && self.timeout_class == other.timeout_class
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.same_shape(b))
    }

    /// Structural checks run at registration.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidDescriptor {
                tool: self.name.clone(),
                reason: "empty name".to_string(),
            });
        }
        for (i, param) in self.parameters.iter().enumerate() {
            if param.required && param.default.is_some() {
                return Err(DomainError::InvalidDescriptor {
                    tool: self.name.clone(),
                    reason: format!("required parameter '{}' declares a default", param.name),
                });
            }
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(DomainError::InvalidDescriptor {
                    tool: self.name.clone(),
                    reason: format!("duplicate parameter '{}'", param.name),
                });
            }
        }
        Ok(())
    }

    /// One-line signature for planner prompts, e.g. `read_memory(address: integer, size: integer)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match (&p.default, p.required) {
                (_, true) => format!("{}: {}", p.name, p.param_type),
                (Some(d), false) => format!("{}: {} = {}", p.name, p.param_type, d),
                (None, false) => format!("{}?: {}", p.name, p.param_type),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_memory() -> ToolDescriptor {
        ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
            .with_parameter(ParameterSpec::required("address", ParamType::Integer))
            .with_parameter(ParameterSpec::required("size", ParamType::Integer))
    }

    #[test]
    fn test_signature_lists_defaults() {
        let tool = ToolDescriptor::new("disassemble", ToolCategory::Debug)
            .with_parameter(ParameterSpec::required("address", ParamType::Integer))
            .with_parameter(ParameterSpec::with_default("count", ParamType::Integer, 20))
            .with_parameter(ParameterSpec::optional("id", ParamType::String));
        assert_eq!(
            tool.signature(),
            "disassemble(address: integer, count: integer = 20, id?: string)"
        );
    }

    #[test]
    fn test_check_rejects_required_with_default() {
        let mut bad = read_memory();
        bad.parameters[0].default = Some(json!(0));
        assert!(matches!(
            bad.check(),
            Err(DomainError::InvalidDescriptor { .. })
        ));
        assert!(read_memory().check().is_ok());
    }

    #[test]
    fn test_check_rejects_duplicate_parameter() {
        let bad = read_memory().with_parameter(ParameterSpec::optional("size", ParamType::Integer));
        assert!(bad.check().is_err());
    }

    #[test]
    fn test_same_shape_ignores_description() {
        let a = read_memory().describe("Read bytes");
        let b = read_memory().describe("Read raw memory");
        assert!(a.same_shape(&b));
    }

    #[test]
    fn test_same_shape_detects_type_change() {
        let a = read_memory();
        let mut b = read_memory();
        b.parameters[1].param_type = ParamType::String;
        assert!(!a.same_shape(&b));
        let c = read_memory().with_timeout_class(TimeoutClass::Scan);
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_timeout_class_default_and_serde() {
        assert_eq!(TimeoutClass::default(), TimeoutClass::Standard);
        let v = serde_json::to_value(TimeoutClass::Scan).unwrap();
        assert_eq!(v, json!("scan"));
        assert_eq!(ToolCategory::MemoryRead.to_string(), "memory_read");
    }
}
