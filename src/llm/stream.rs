//! Server-sent-event decoding and reply assembly

use std::collections::HashMap;
use std::io::BufRead;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::{Delta, LlmError, ToolCall, ToolCallDelta};

/// A lazily decoded stream of reply deltas.
pub type DeltaStream = Box<dyn Iterator<Item = Result<Delta, LlmError>>>;

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

/// Decodes `data: {...}` lines from an SSE body until `data: [DONE]` or EOF.
pub struct SseStream<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> SseStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }

    fn decode(data: &str) -> Option<Result<Delta, LlmError>> {
        let chunk: Chunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => return Some(Err(LlmError::Json(e))),
        };
        if let Some(error) = chunk.error {
            return Some(Err(LlmError::InvalidStream(error.to_string())));
        }
        chunk.choices.into_iter().next().map(|choice| Ok(choice.delta))
    }
}

impl<R: BufRead> Iterator for SseStream<R> {
    type Item = Result<Delta, LlmError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    debug!("SseStream: body ended without [DONE]");
                    self.finished = true;
                }
                Ok(_) => {
                    let line = self.line.trim();
                    let Some(data) = line.strip_prefix("data:") else {
                        // blank separators, comments and `event:` lines
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        self.finished = true;
                        continue;
                    }
                    trace!(%data, "SseStream: chunk");
                    if let Some(item) = Self::decode(data) {
                        if item.is_err() {
                            self.finished = true;
                        }
                        return Some(item);
                    }
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(LlmError::Io(e)));
                }
            }
        }
        None
    }
}

/// Joins tool-call fragments into calls.
///
/// Indexed fragments are grouped by `index`. A fragment without one continues
/// the last index-less call unless it opens a new call: a different non-empty
/// `id`, or a name while the open call is already named.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    calls: Vec<ToolCall>,
    by_index: HashMap<usize, usize>,
    open: Option<usize>,
}

impl ToolCallAssembler {
    pub fn push(&mut self, fragment: &ToolCallDelta) {
        let slot = match fragment.index {
            Some(index) => *self.by_index.entry(index).or_insert_with(|| {
                self.calls.push(ToolCall::default());
                self.calls.len() - 1
            }),
            None => match self.open {
                Some(slot) if !opens_new_call(&self.calls[slot], fragment) => slot,
                _ => {
                    self.calls.push(ToolCall::default());
                    let slot = self.calls.len() - 1;
                    self.open = Some(slot);
                    slot
                }
            },
        };

        let call = &mut self.calls[slot];
        if let Some(id) = fragment.id.as_deref().filter(|id| !id.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(name) = fragment.function.name.as_deref().filter(|n| !n.is_empty()) {
            call.name = name.to_string();
        }
        if let Some(arguments) = &fragment.function.arguments {
            call.arguments.push_str(arguments);
        }
    }

    /// Completed calls in the order they were first seen.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
    }
}

fn opens_new_call(open: &ToolCall, fragment: &ToolCallDelta) -> bool {
    let id = fragment.id.as_deref().unwrap_or_default();
    let name = fragment.function.name.as_deref().unwrap_or_default();
    if id.is_empty() {
        !name.is_empty() && !open.name.is_empty()
    } else {
        id != open.id
    }
}

/// A fully consumed reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Consume a stream, forwarding each content fragment to `sink` as it arrives.
pub fn drain(stream: DeltaStream, mut sink: impl FnMut(&str)) -> Result<Reply, LlmError> {
    let mut content = String::new();
    let mut assembler = ToolCallAssembler::default();

    for delta in stream {
        let delta = delta?;
        if let Some(text) = delta.content.as_deref().filter(|t| !t.is_empty()) {
            sink(text);
            content.push_str(text);
        }
        for fragment in &delta.tool_calls {
            assembler.push(fragment);
        }
    }

    Ok(Reply {
        content,
        tool_calls: assembler.finish(),
    })
}
