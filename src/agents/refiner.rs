use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::{SessionState, Verdict, preview};
use crate::console::{Banner, Console};
use crate::llm::{ChatClient, ChatRequest, LlmError, Message, drain};
use crate::parse::json_object;
use crate::prompts::PROMPT_REFINER;
use crate::retry::RetryPolicy;
use crate::{Agent, AgentError, Ctx, Outcome, TurnResult};

/// The refiner's decision about a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Refinement {
    #[serde(rename = "continue")]
    pub proceed: bool,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl Refinement {
    /// Stand-in for a reply that could not be read.
    pub fn invalid() -> Self {
        Self {
            proceed: false,
            prompt: String::new(),
            error: Some("Invalid JSON response".to_string()),
        }
    }

    /// Read the model's reply. Never fails: unreadable replies become [`Refinement::invalid`].
    pub fn from_model_output(output: &str) -> Self {
        let Some(object) = json_object(output, &["continue"]) else {
            error!("Invalid response from prompt_agent: {}...", preview(output, 200));
            return Self::invalid();
        };
        match serde_json::from_value(Value::Object(object)) {
            Ok(refinement) => refinement,
            Err(e) => {
                error!("Malformed refinement from prompt_agent: {e}");
                Self::invalid()
            }
        }
    }
}

/// Refines the operator's free-text request into a project description.
pub struct PromptAgent {
    client: Rc<dyn ChatClient>,
    model: String,
    retry: RetryPolicy,
}

impl PromptAgent {
    pub const NAME: &'static str = "prompt_agent";

    pub fn new(client: Rc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One streamed call (retried on failure). Fragments go to `console` as they arrive.
    pub fn refine(&self, input: &str, console: &mut dyn Console) -> Result<Refinement, LlmError> {
        info!("Starting prompt_agent with input: {}...", preview(input, 100));
        let refinement = self.retry.run(Self::NAME, || -> Result<Refinement, LlmError> {
            let request = ChatRequest::new(
                self.model.as_str(),
                vec![Message::system(PROMPT_REFINER), Message::user(input)],
            );
            let stream = self.client.stream(&request)?;
            let reply = drain(stream, |text| console.fragment(text));
            console.end_stream();
            Ok(Refinement::from_model_output(&reply?.content))
        })?;
        info!("prompt_agent completed. Continue: {}", refinement.proceed);
        Ok(refinement)
    }
}

impl Agent<SessionState> for PromptAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&mut self, mut state: SessionState, ctx: &mut Ctx) -> TurnResult<SessionState> {
        if state.input.trim().is_empty() {
            return Err(AgentError::invalid("empty request"));
        }

        match self.refine(&state.input, ctx.console()) {
            Ok(refinement) if refinement.proceed => {
                state.description = if refinement.prompt.trim().is_empty() {
                    state.input.clone()
                } else {
                    refinement.prompt
                };
                ctx.log("prompt_agent: request refined");
                Ok((state, Outcome::Continue))
            }
            Ok(refinement) => {
                let message = if refinement.error.is_some() {
                    "Could not read the prompt refiner's reply. Please try again."
                } else {
                    "This prompt is not related to OpenTofu. Please provide an OpenTofu-related request."
                };
                ctx.console().banner(Banner::Warning, message);
                ctx.log("prompt_agent: request declined");
                state.verdict = Verdict::Unrelated;
                Ok((state, Outcome::Done))
            }
            Err(e) => {
                error!("prompt_agent failed: {e}");
                let console = ctx.console();
                console.banner(Banner::Error, &format!("Error processing prompt: {e}"));
                console.banner(Banner::Warning, "Falling back to using your input directly...");
                state.description = state.input.clone();
                ctx.log("prompt_agent: fell back to raw input");
                Ok((state, Outcome::Continue))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::mock::MockConsole;
    use crate::llm::Delta;
    use crate::llm::mock::{MockChatClient, MockReply};
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn agent(client: &Rc<MockChatClient>) -> PromptAgent {
        PromptAgent::new(client.clone(), "grok-4-0709").with_retry(fast_retry())
    }

    #[test]
    fn malformed_json_yields_sentinel() {
        for output in ["", "not json", "{\"prompt\": \"x\"", "[true]", "{\"prompt\": \"x\"}", "{\"continue\": \"yes\"}"] {
            assert_eq!(Refinement::from_model_output(output), Refinement::invalid(), "{output}");
        }
        let sentinel = Refinement::invalid();
        assert!(!sentinel.proceed);
        assert_eq!(sentinel.prompt, "");
        assert_eq!(sentinel.error.as_deref(), Some("Invalid JSON response"));
    }

    #[test]
    fn valid_reply_is_parsed() {
        let refinement = Refinement::from_model_output(r#"{"prompt": "Build a VPC module", "continue": true}"#);
        assert!(refinement.proceed);
        assert_eq!(refinement.prompt, "Build a VPC module");
        assert_eq!(refinement.error, None);
    }

    #[test]
    fn streamed_fragments_are_joined_and_echoed() {
        let client = Rc::new(MockChatClient::new(vec![MockReply::Deltas(vec![
            Delta::text("{\"prompt\": \"VPC\", "),
            Delta::text("\"continue\": true}"),
        ])]));
        let mut console = MockConsole::new();
        let transcript = console.transcript();

        let refinement = agent(&client).refine("make me a vpc", &mut console).unwrap();

        assert!(refinement.proceed);
        assert_eq!(transcript.borrow().fragments.len(), 2);
        let requests = client.requests();
        let request = &requests[0];
        assert_eq!(request.model, "grok-4-0709");
        assert!(request.tools.is_empty());
        assert_eq!(request.messages[1], Message::user("make me a vpc"));
    }

    #[test]
    fn transient_failures_are_retried() {
        let client = Rc::new(MockChatClient::new(vec![
            MockReply::Fail("connection reset".into()),
            MockReply::text(r#"{"prompt": "p", "continue": true}"#),
        ]));
        let refinement = agent(&client).refine("vpc", &mut MockConsole::new()).unwrap();
        assert!(refinement.proceed);
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn gives_up_after_three_attempts() {
        let client = Rc::new(MockChatClient::new(vec![
            MockReply::Fail("down".into()),
            MockReply::Fail("down".into()),
            MockReply::Fail("down".into()),
            MockReply::text(r#"{"prompt": "p", "continue": true}"#),
        ]));
        let err = agent(&client).refine("vpc", &mut MockConsole::new()).unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
        assert_eq!(client.call_count(), 3);
    }

    #[test]
    fn unrelated_request_ends_turn() {
        let client = Rc::new(MockChatClient::new(vec![MockReply::text(
            r#"{"prompt": "I am not sure how to help with that.", "continue": false}"#,
        )]));
        let console = MockConsole::new();
        let transcript = console.transcript();
        let mut ctx = Ctx::new(console);

        let (state, outcome) = agent(&client).run(SessionState::new("bake a cake"), &mut ctx).unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(state.verdict, Verdict::Unrelated);
        assert!(transcript.borrow().has_banner(Banner::Warning, "not related to OpenTofu"));
    }

    #[test]
    fn failure_falls_back_to_raw_input() {
        let client = Rc::new(MockChatClient::new(vec![]));
        let mut ctx = Ctx::new(MockConsole::new());

        let (state, outcome) = agent(&client).run(SessionState::new("make a vpc"), &mut ctx).unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.description, "make a vpc");
    }

    #[test]
    fn refined_prompt_replaces_input() {
        let client = Rc::new(MockChatClient::new(vec![MockReply::text(
            r#"{"prompt": "Create an AWS VPC module with two subnets", "continue": true}"#,
        )]));
        let mut ctx = Ctx::new(MockConsole::new());

        let (state, outcome) = agent(&client).run(SessionState::new("vpc pls"), &mut ctx).unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.description, "Create an AWS VPC module with two subnets");
    }
}
