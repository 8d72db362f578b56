//! Chat-completion client, wire types and stream decoding

mod client;
mod error;
mod stream;
mod types;

pub use client::{ChatClient, OpenAiClient};
pub use error::LlmError;
pub use stream::{DeltaStream, Reply, SseStream, ToolCallAssembler, drain};
pub use types::{ChatRequest, Delta, FunctionDelta, Message, Role, ToolCall, ToolCallDelta, ToolDefinition};
