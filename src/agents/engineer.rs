use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{SessionState, Verdict, preview};
use crate::console::{Banner, Console, ConsoleError};
use crate::history::ConversationHistory;
use crate::llm::{ChatClient, ChatRequest, LlmError, Message, ToolCall, drain};
use crate::plan::{Plan, Step, StepStatus};
use crate::prompts::INFRASTRUCTURE_ENGINEER;
use crate::tools::{ToolError, ToolRegistry};
use crate::{Agent, Ctx, Outcome, TurnResult};

pub const CONFIRM_PROMPT: &str = "Do you want to call this tool? (y/n) ";

#[derive(Debug, Error)]
pub enum EngineerError {
    /// Confined to the step that raised it.
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("console: {0}")]
    Console(#[from] ConsoleError),

    #[error("could not serialize message: {0}")]
    Json(#[from] serde_json::Error),
}

enum CallOutcome {
    Executed,
    Declined,
    Failed(String),
}

/// Carries out a plan one step at a time, gating every tool call on the
/// operator's confirmation.
pub struct InfrastructureEngineer {
    client: Rc<dyn ChatClient>,
    model: String,
    registry: Rc<ToolRegistry>,
}

impl InfrastructureEngineer {
    pub const NAME: &'static str = "infrastructure_engineer_agent";

    pub fn new(client: Rc<dyn ChatClient>, model: impl Into<String>, registry: Rc<ToolRegistry>) -> Self {
        Self {
            client,
            model: model.into(),
            registry,
        }
    }

    /// One pass over `plan` with a fresh history. Returns `false` only on a
    /// fatal error; failures inside a step are recorded on the step instead.
    pub fn execute(&self, plan: &mut Plan, console: &mut dyn Console) -> bool {
        let mut history = ConversationHistory::with_system(INFRASTRUCTURE_ENGINEER);
        self.execute_with(plan, &mut history, console)
    }

    /// Like [`execute`](Self::execute), appending to a caller-owned history.
    pub fn execute_with(
        &self,
        plan: &mut Plan,
        history: &mut ConversationHistory,
        console: &mut dyn Console,
    ) -> bool {
        info!("Starting infrastructure_engineer_agent with {} steps", plan.len());
        if plan.is_empty() {
            warn!("Empty code plan provided to infrastructure_engineer_agent");
            return false;
        }

        match self.run_plan(plan, history, console) {
            Ok(()) => {
                info!("infrastructure_engineer_agent completed");
                true
            }
            Err(e) => {
                error!("Fatal error in infrastructure_engineer_agent: {e}");
                console.banner(Banner::Error, &format!("Fatal error in infrastructure engineer: {e}"));
                false
            }
        }
    }

    fn run_plan(
        &self,
        plan: &mut Plan,
        history: &mut ConversationHistory,
        console: &mut dyn Console,
    ) -> Result<(), EngineerError> {
        let total = plan.len();
        for (index, step) in plan.steps_mut().iter_mut().enumerate() {
            if step.is_terminal() {
                debug!(step = step.step, status = ?step.status(), "skipping finished step");
                continue;
            }
            info!(
                "Processing step {}/{total}: {}...",
                index + 1,
                preview(&step.to_string(), 100)
            );

            match self.run_step(step, history, console) {
                Ok(()) => {}
                Err(EngineerError::Llm(e)) => {
                    error!("Error processing step {}: {e}", index + 1);
                    console.end_stream();
                    console.banner(Banner::Error, &format!("Error processing step {}: {e}", index + 1));
                    step.fail(e.to_string());
                }
                Err(fatal) => return Err(fatal),
            }

            match step.status() {
                StepStatus::Completed => console.banner(Banner::Success, &step.to_string()),
                StepStatus::Error => console.banner(Banner::Error, &step.to_string()),
                StepStatus::Pending => {
                    warn!("Step {} left pending", index + 1);
                    console.banner(Banner::Warning, &format!("{step} (skipped, still pending)"));
                }
            }
        }
        Ok(())
    }

    fn run_step(
        &self,
        step: &mut Step,
        history: &mut ConversationHistory,
        console: &mut dyn Console,
    ) -> Result<(), EngineerError> {
        history.push(Message::user(serde_json::to_string(step)?));

        let request = ChatRequest::new(self.model.as_str(), history.messages().to_vec())
            .with_tools(self.registry.definitions());
        let stream = self.client.stream(&request)?;
        let reply = drain(stream, |text| console.fragment(text))?;
        console.end_stream();

        if !reply.content.is_empty() {
            history.push(Message::assistant(reply.content));
        }

        let mut declined = 0;
        let mut errors = Vec::new();
        for call in &reply.tool_calls {
            match self.handle_tool_call(call, history, console)? {
                CallOutcome::Executed => {}
                CallOutcome::Declined => declined += 1,
                CallOutcome::Failed(message) => errors.push(message),
            }
        }

        if !errors.is_empty() {
            step.fail(errors.join("; "));
        } else if declined == 0 {
            step.mark_completed();
        }
        Ok(())
    }

    fn handle_tool_call(
        &self,
        call: &ToolCall,
        history: &mut ConversationHistory,
        console: &mut dyn Console,
    ) -> Result<CallOutcome, EngineerError> {
        console.banner(Banner::Info, &format!("Tool Call: {}", call.name));
        console.banner(Banner::Plain, &format!("Arguments: {}", call.arguments));

        let confirmed = match console.read_line(CONFIRM_PROMPT)? {
            Some(answer) => answer.trim().eq_ignore_ascii_case("y"),
            None => {
                console.banner(Banner::Warning, "Operation cancelled by user.");
                false
            }
        };
        if !confirmed {
            info!(tool = %call.name, "tool call declined");
            console.banner(Banner::Plain, "Skipping tool call.");
            return Ok(CallOutcome::Declined);
        }

        match self.registry.dispatch(call) {
            Ok(result) => {
                info!(tool = %call.name, "tool call executed");
                console.banner(Banner::Success, &format!("Tool result: {result}"));
                history.push(Message::tool_result(call.id.as_str(), serde_json::to_string(&result)?));
                Ok(CallOutcome::Executed)
            }
            Err(e @ ToolError::UnknownTool(_)) => {
                error!("{e}");
                console.banner(Banner::Error, &format!("Error: Unknown tool '{}'", call.name));
                Ok(CallOutcome::Failed(e.to_string()))
            }
            Err(e) => {
                error!(tool = %call.name, "{e}");
                console.banner(Banner::Error, &e.to_string());
                Ok(CallOutcome::Failed(e.to_string()))
            }
        }
    }
}

impl Agent<SessionState> for InfrastructureEngineer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&mut self, mut state: SessionState, ctx: &mut Ctx) -> TurnResult<SessionState> {
        let succeeded = self.execute(&mut state.plan, ctx.console());
        state.verdict = if succeeded {
            Verdict::Succeeded
        } else {
            Verdict::Incomplete
        };
        ctx.log(format!(
            "infrastructure_engineer_agent: {} of {} steps completed",
            state.plan.count(StepStatus::Completed),
            state.plan.len()
        ));
        Ok((state, Outcome::Done))
    }
}
