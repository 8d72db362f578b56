//! Chat-completion request/response types
//!
//! These follow the OpenAI chat-completions wire format, which the xAI
//! endpoint and most self-hosted gateways also speak.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// A tool's serialized result, tagged with the call it answers. Sent with
    /// the assistant role because the calls themselves are not kept in the
    /// history.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Role::Assistant, content)
        }
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
            tool_call_id: None,
        }
    }
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument record
    pub parameters: Value,
}

impl ToolDefinition {
    /// The `{"type": "function", "function": {...}}` envelope used on the wire.
    pub fn to_function_spec(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Everything needed for one streamed completion call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    /// Attach tool schemas and let the model decide whether to call them.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tool_choice = (!tools.is_empty()).then(|| "auto".to_string());
        self.tools = tools;
        self
    }

    /// Request body as sent to `/chat/completions`.
    pub fn to_wire(&self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
            "stream": true,
        });
        if !self.tools.is_empty() {
            let tools: Vec<Value> = self.tools.iter().map(ToolDefinition::to_function_spec).collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(choice) = &self.tool_choice {
            body["tool_choice"] = Value::String(choice.clone());
        }
        body
    }
}

/// One incremental piece of a streamed reply
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool_calls: Vec<ToolCallDelta>,
}

impl Delta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A delta carrying one complete tool call at `index`.
    pub fn tool_call(index: usize, id: &str, name: &str, arguments: &str) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCallDelta {
                index: Some(index),
                id: Some(id.to_string()),
                function: FunctionDelta {
                    name: Some(name.to_string()),
                    arguments: Some(arguments.to_string()),
                },
            }],
        }
    }
}

/// A fragment of a tool call; fragments sharing an `index` form one call.
/// Some providers omit `index` and send each call whole.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: FunctionDelta,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// A tool call requested by the model, assembled from its fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument string as produced by the model
    pub arguments: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
