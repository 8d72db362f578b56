//! Tools the model may call, and the registry that dispatches them
//!
//! Every tool is a synchronous, stateless function over a typed argument
//! record. Tools are only ever reached through [`ToolRegistry::dispatch`],
//! which the executor calls after the operator confirms a request.

pub mod command;
pub mod file;

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::llm::{ToolCall, ToolDefinition};

pub use command::{CmdOutput, OpenTofu, run_cmd_in_dir};
pub use file::{CreateDirectory, DeleteDirectory, DeleteFile, ReadFile, WriteFile};

/// A tool that can be called by the model.
pub trait Tool {
    /// Tool name, matching `function.name` in the model's tool call.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the argument record.
    fn parameters(&self) -> Value;

    /// Run the tool with the model's raw JSON argument string.
    fn call(&self, arguments: &str) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Tool execution failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode the model's argument string into the tool's argument record.
pub fn parse_args<A: DeserializeOwned>(arguments: &str) -> Result<A, ToolError> {
    Ok(serde_json::from_str(arguments)?)
}

/// JSON Schema advertised for an argument record, without the `$schema` key.
pub fn args_schema<A: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(A))
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(&'static str),
}

pub struct ToolRegistryBuilder {
    tools: Vec<Box<dyn Tool>>,
    duplicate: Option<&'static str>,
}

impl ToolRegistryBuilder {
    pub fn register<T: Tool + 'static>(mut self, tool: T) -> Self {
        let name = tool.name();
        if self.tools.iter().any(|t| t.name() == name) {
            self.duplicate = Some(name);
        }
        self.tools.push(Box::new(tool));
        self
    }

    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        if let Some(name) = self.duplicate {
            return Err(RegistryError::DuplicateTool(name));
        }
        let index = self.tools.iter().enumerate().map(|(i, t)| (t.name(), i)).collect();
        Ok(ToolRegistry {
            tools: self.tools,
            index,
        })
    }
}

/// Fixed name -> tool mapping. Registration order is the order schemas are
/// advertised in.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder {
            tools: Vec::new(),
            duplicate: None,
        }
    }

    /// File, directory and OpenTofu tools, with `tofu_bin` as the OpenTofu executable.
    pub fn standard(tofu_bin: impl Into<String>) -> Result<Self, RegistryError> {
        Self::builder()
            .register(WriteFile)
            .register(ReadFile)
            .register(DeleteFile)
            .register(CreateDirectory)
            .register(DeleteDirectory)
            .register(OpenTofu::new(tofu_bin))
            .build()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a confirmed tool call.
    pub fn dispatch(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        debug!(tool = %call.name, id = %call.id, "ToolRegistry::dispatch");
        tool.call(&call.arguments)
    }
}
