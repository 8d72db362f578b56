//! The interactive loop: read a request, run one turn, repeat

use std::rc::Rc;

use colored::Colorize;
use tracing::{error, info};

use crate::agents::{InfrastructureEngineer, PlanningAgent, PromptAgent, SessionState, Verdict};
use crate::config::Models;
use crate::console::{Banner, Console, ConsoleError};
use crate::llm::ChatClient;
use crate::plan::StepStatus;
use crate::retry::RetryPolicy;
use crate::tools::ToolRegistry;
use crate::{AgentError, Ctx, Runner, Workflow, WorkflowError};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

pub struct Session {
    runner: Runner<SessionState>,
    ctx: Ctx,
}

impl Session {
    pub fn new(
        client: Rc<dyn ChatClient>,
        registry: Rc<ToolRegistry>,
        models: &Models,
        console: impl Console + 'static,
    ) -> Result<Self, WorkflowError> {
        Self::with_retry(client, registry, models, console, RetryPolicy::default())
    }

    /// Like [`new`](Self::new) with the retry policy used by the refiner and planner.
    pub fn with_retry(
        client: Rc<dyn ChatClient>,
        registry: Rc<ToolRegistry>,
        models: &Models,
        console: impl Console + 'static,
        retry: RetryPolicy,
    ) -> Result<Self, WorkflowError> {
        let workflow = Workflow::builder("tofumatic")
            .register(PromptAgent::new(client.clone(), models.refiner.as_str()).with_retry(retry))
            .register(
                PlanningAgent::new(client.clone(), models.planner.as_str(), registry.definitions()).with_retry(retry),
            )
            .register(InfrastructureEngineer::new(client, models.engineer.as_str(), registry))
            .start_at(PromptAgent::NAME)
            .then(PlanningAgent::NAME)
            .then(InfrastructureEngineer::NAME)
            .build()?;
        info!("Workflow {}: {}", workflow.name(), workflow.phases().join(" -> "));

        Ok(Self {
            runner: Runner::new(workflow).with_tracing(),
            ctx: Ctx::new(console),
        })
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Run one request through refine, plan and execute.
    pub fn turn(&mut self, input: &str) -> Result<SessionState, AgentError> {
        let n = self.ctx.begin_session();
        self.ctx.clear_logs();
        info!("Starting session {n}");

        let state = self.runner.run(SessionState::new(input), &mut self.ctx)?;

        let console = self.ctx.console();
        match state.verdict {
            Verdict::Succeeded => {
                console.banner(Banner::Success, &format!("Session {n} completed successfully!"));
                console.banner(
                    Banner::Plain,
                    &format!(
                        "Steps: {} completed, {} failed, {} pending",
                        state.plan.count(StepStatus::Completed),
                        state.plan.count(StepStatus::Error),
                        state.plan.count(StepStatus::Pending)
                    ),
                );
            }
            Verdict::Incomplete => {
                console.banner(Banner::Warning, &format!("Session {n} did not complete all steps."));
            }
            _ => {}
        }
        info!("Session {n} finished: {:?}", state.verdict);
        Ok(state)
    }

    /// Serve requests until the operator leaves. `initial` runs first, as if typed.
    pub fn run(&mut self, initial: Option<String>) -> Result<(), ConsoleError> {
        let prompt = format!("{} ", "tofumatic ■".yellow().bold());
        let mut pending = initial;

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match self.ctx.console().read_line(&prompt) {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(ConsoleError::Closed) => {
                        info!("Session loop interrupted");
                        self.ctx.console().banner(Banner::Warning, "Operation cancelled by user. Goodbye!");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                },
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w)) {
                self.ctx.console().banner(Banner::Info, "Goodbye!");
                return Ok(());
            }

            if let Err(e) = self.turn(input) {
                error!("Session {} failed: {e}", self.ctx.session());
                self.ctx.console().banner(Banner::Error, &format!("Error: {e}"));
            }
            self.ctx.console().banner(Banner::Plain, &"=".repeat(50));
        }
    }
}
