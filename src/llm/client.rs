//! ChatClient trait and the blocking OpenAI-compatible implementation

use std::io::BufReader;
use std::time::Duration;

use tracing::{debug, warn};
use ureq::Agent;

use super::{ChatRequest, DeltaStream, LlmError, SseStream};

/// A chat-completion backend that streams its reply.
pub trait ChatClient {
    /// Start a streamed completion. The returned stream is lazy: deltas are
    /// decoded as the caller pulls them.
    fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, LlmError>;
}

/// Blocking client for any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiClient {
    agent: Agent,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// `timeout` of `None` waits on the API indefinitely.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl ChatClient for OpenAiClient {
    fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, LlmError> {
        let url = self.endpoint();
        debug!(%url, model = %request.model, messages = request.messages.len(), "OpenAiClient::stream");

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "text/event-stream")
            .send_json(request.to_wire())?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.body_mut().read_to_string().unwrap_or_default();
            warn!(status, %message, "OpenAiClient::stream: request rejected");
            return Err(LlmError::Api { status, message });
        }

        let reader = BufReader::new(response.into_body().into_reader());
        Ok(Box::new(SseStream::new(reader)))
    }
}
