//! Tool System
//!
//! Named, schema-described capabilities the model may ask the agent to
//! invoke. Tools are registered before a run and looked up by name when the
//! reasoning loop dispatches a call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,
    
    /// Raw arguments as proposed by the model
    #[serde(default)]
    pub arguments: Value,
    
    /// Call ID for tracking
    #[serde(default)]
    pub id: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: new_call_id(),
        }
    }
    
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
    
    /// Look up a string argument
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }
}

/// Generate a fresh tool call ID
pub fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,
    
    /// Call ID (if provided in request)
    pub id: Option<String>,
    
    /// Whether execution succeeded
    pub success: bool,
    
    /// Output (success message or error)
    pub output: String,
    
    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }
    
    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }
    
    /// Failure result carrying an agent error's text
    pub fn from_error(name: impl Into<String>, error: &AgentError) -> Self {
        Self::failure(name, error.to_string())
    }
    
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
    
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// JSON type of a tool parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
    
    /// Whether a JSON value has this type
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,
    
    /// JSON type
    #[serde(rename = "type")]
    pub param_type: ParamType,
    
    /// Human-readable description
    pub description: String,
    
    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
    
    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    
    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }
    
    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
    
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
    
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Tool definition (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,
    
    /// Human-readable description (shown to LLM)
    pub description: String,
    
    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSpec {
    /// JSON-schema object describing the parameters
    pub fn json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut property = serde_json::Map::new();
            property.insert("type".into(), Value::from(param.param_type.as_str()));
            property.insert("description".into(), Value::from(param.description.clone()));
            if let Some(default) = &param.default {
                property.insert("default".into(), default.clone());
            }
            if let Some(values) = &param.enum_values {
                property.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }
        
        let required: Vec<&str> = self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
    
    /// Validate raw arguments against the parameter list
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let invalid = |reason: String| AgentError::InvalidArguments {
            tool: self.name.clone(),
            reason,
        };
        
        let args = match arguments {
            Value::Object(map) => map,
            // A tool without parameters may be called with no arguments at all
            Value::Null if self.parameters.iter().all(|p| !p.required) => return Ok(()),
            other => {
                return Err(invalid(format!("arguments must be a JSON object, got {other}")));
            }
        };
        
        for param in &self.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(invalid(format!("missing required parameter '{}'", param.name)));
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    if !param.param_type.matches(value) {
                        return Err(invalid(format!(
                            "parameter '{}' must be of type {}",
                            param.name, param.param_type
                        )));
                    }
                    if let Some(allowed) = &param.enum_values
                        && !allowed.contains(value)
                    {
                        return Err(invalid(format!(
                            "parameter '{}' must be one of {}",
                            param.name,
                            Value::Array(allowed.clone())
                        )));
                    }
                }
            }
        }
        
        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's spec for LLM function calling
    fn spec(&self) -> ToolSpec;
    
    /// Execute the tool with already-validated arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry for available tools
///
/// Populated before runs start and shared read-only between them.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }
    
    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }
    
    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.spec().name;
        if self.tools.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }
    
    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }
    
    /// Resolve, validate and execute a tool call
    ///
    /// Unknown tools and invalid arguments are returned as errors before any
    /// handler runs. Handler failures are caught and come back as a failed
    /// `ToolResult`.
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self.get(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;
        
        tool.spec().validate(&call.arguments)?;
        
        let result = match tool.execute(call).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool execution failed");
                let err = match e {
                    err @ AgentError::ToolExecution(_) => err,
                    other => AgentError::ToolExecution(other.to_string()),
                };
                ToolResult::from_error(&call.name, &err)
            }
        };
        
        Ok(result.with_id(call.id.clone()))
    }
    
    /// Get all tool specs, ordered by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }
    
    /// Get tool names, ordered
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
    
    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }
    
    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
    
    /// Generate system prompt section describing available tools
    pub fn generate_prompt_section(&self) -> String {
        crate::react::tool_prompt_section(&self.specs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echo tool that counts how often its handler ran
    struct EchoTool {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl EchoTool {
        fn new(name: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { name, calls: calls.clone() }, calls)
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.name.into(),
                description: "Echo the text back".into(),
                parameters: vec![
                    ParameterSchema::required("text", ParamType::String, "Text to echo"),
                    ParameterSchema::optional("times", ParamType::Integer, "Repeat count")
                        .with_default(json!(1)),
                    ParameterSchema::optional("style", ParamType::String, "Output style")
                        .with_enum(vec![json!("plain"), json!("loud")]),
                ],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = call.str_arg("text").unwrap_or_default();
            if text == "fail" {
                return Err(AgentError::Other("echo refused".into()));
            }
            Ok(ToolResult::success(self.name, text))
        }
    }

    #[test]
    fn test_duplicate_registration_leaves_registry_unchanged() {
        let mut registry = ToolRegistry::new();
        let (first, _) = EchoTool::new("echo");
        let (second, _) = EchoTool::new("echo");
        
        registry.register(first).unwrap();
        let err = registry.register(second).unwrap_err();
        
        assert!(matches!(err, AgentError::DuplicateTool(ref name) if name == "echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_never_runs_a_handler() {
        let mut registry = ToolRegistry::new();
        let (echo, calls) = EchoTool::new("echo");
        registry.register(echo).unwrap();
        
        let call = ToolCall::new("search", json!({"text": "hi"}));
        let err = registry.invoke(&call).await.unwrap_err();
        
        assert!(matches!(err, AgentError::UnknownTool(ref name) if name == "search"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_handler() {
        let mut registry = ToolRegistry::new();
        let (echo, calls) = EchoTool::new("echo");
        registry.register(echo).unwrap();
        
        let cases = [
            json!({}),
            json!({"text": 42}),
            json!({"text": "hi", "times": 1.5}),
            json!({"text": "hi", "style": "fancy"}),
            json!("text=hi"),
        ];
        for arguments in cases {
            let call = ToolCall::new("echo", arguments.clone());
            let err = registry.invoke(&call).await.unwrap_err();
            assert!(
                matches!(err, AgentError::InvalidArguments { .. }),
                "expected InvalidArguments for {arguments}, got {err:?}"
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_is_returned_not_raised() {
        let mut registry = ToolRegistry::new();
        let (echo, calls) = EchoTool::new("echo");
        registry.register(echo).unwrap();
        
        let call = ToolCall::new("echo", json!({"text": "fail"})).with_id("call_7");
        let result = registry.invoke(&call).await.unwrap();
        
        assert!(!result.success);
        assert_eq!(result.id.as_deref(), Some("call_7"));
        assert!(result.output.contains("echo refused"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_invoke() {
        let mut registry = ToolRegistry::new();
        let (echo, _) = EchoTool::new("echo");
        registry.register(echo).unwrap();
        
        let call = ToolCall::new("echo", json!({"text": "hello", "style": "loud"}));
        let result = registry.invoke(&call).await.unwrap();
        
        assert!(result.success);
        assert_eq!(result.output, "hello");
        assert_eq!(result.id.as_deref(), Some(call.id.as_str()));
    }

    #[test]
    fn test_json_schema() {
        let (echo, _) = EchoTool::new("echo");
        let schema = echo.spec().json_schema();
        
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["text"]));
        assert_eq!(schema["properties"]["times"]["type"], "integer");
        assert_eq!(schema["properties"]["style"]["enum"], json!(["plain", "loud"]));
    }

    #[test]
    fn test_tool_call_accepts_tool_alias() {
        let call: ToolCall =
            serde_json::from_str(r#"{"tool": "echo", "arguments": {"text": "x"}}"#).unwrap();
        assert_eq!(call.name, "echo");
        assert_eq!(call.str_arg("text"), Some("x"));
        assert!(call.id.is_empty());
    }
}
