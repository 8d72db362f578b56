use std::rc::Rc;

use tracing::{error, info, warn};

use super::{SessionState, Verdict, preview};
use crate::console::{Banner, Console};
use crate::llm::{ChatClient, ChatRequest, LlmError, Message, ToolDefinition, drain};
use crate::plan::Plan;
use crate::prompts::CODE_PLANNER;
use crate::retry::RetryPolicy;
use crate::{Agent, Ctx, Outcome, TurnResult};

/// Turns a project description into an ordered plan.
///
/// Tool schemas go along with the request so the model can name tools in
/// its steps; any tool calls it makes anyway are ignored.
pub struct PlanningAgent {
    client: Rc<dyn ChatClient>,
    model: String,
    tools: Vec<ToolDefinition>,
    retry: RetryPolicy,
}

impl PlanningAgent {
    pub const NAME: &'static str = "code_planning_agent";

    pub fn new(client: Rc<dyn ChatClient>, model: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            client,
            model: model.into(),
            tools,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn plan(&self, description: &str, console: &mut dyn Console) -> Result<Plan, LlmError> {
        info!("Starting code_planning_agent with description: {}...", preview(description, 100));
        self.retry.run(Self::NAME, || -> Result<Plan, LlmError> {
            let request = ChatRequest::new(
                self.model.as_str(),
                vec![Message::system(CODE_PLANNER), Message::user(description)],
            )
            .with_tools(self.tools.clone());
            let stream = self.client.stream(&request)?;
            let reply = drain(stream, |text| console.fragment(text));
            console.end_stream();
            let reply = reply?;
            if !reply.tool_calls.is_empty() {
                warn!("code_planning_agent ignored {} tool call(s)", reply.tool_calls.len());
            }
            Ok(Plan::from_model_output(&reply.content))
        })
    }
}

impl Agent<SessionState> for PlanningAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&mut self, mut state: SessionState, ctx: &mut Ctx) -> TurnResult<SessionState> {
        let description = if state.description.trim().is_empty() {
            state.input.clone()
        } else {
            state.description.clone()
        };

        match self.plan(&description, ctx.console()) {
            Ok(plan) if plan.is_empty() => {
                ctx.console().banner(
                    Banner::Error,
                    "Failed to generate a valid code plan. Skipping to next prompt.",
                );
                state.verdict = Verdict::NoPlan;
                Ok((state, Outcome::Done))
            }
            Ok(plan) => {
                ctx.log(format!("code_planning_agent: {} steps", plan.len()));
                state.plan = plan;
                Ok((state, Outcome::Continue))
            }
            Err(e) => {
                error!("code_planning_agent failed: {e}");
                ctx.console().banner(Banner::Error, &format!("Error generating code plan: {e}"));
                state.verdict = Verdict::NoPlan;
                Ok((state, Outcome::Done))
            }
        }
    }
}
