//! Plan and apply OpenTofu changes with an LLM, one confirmed tool call at a time.
//!
//! A session turn runs three agents in a [`Workflow`]: the request is
//! refined into a project description, the description is planned into a
//! [`Plan`] of steps, and the plan is executed step by step. Every tool call
//! the model asks for is shown to the operator and runs only after a `y`.
//!
//! # Quick start
//!
//! ```no_run
//! use std::rc::Rc;
//! use tofumatic::{Models, OpenAiClient, Session, Terminal, ToolRegistry};
//!
//! let client = Rc::new(OpenAiClient::new("https://api.x.ai/v1", "xai-...", None));
//! let registry = Rc::new(ToolRegistry::standard("tofu").unwrap());
//! let console = Terminal::new().unwrap();
//!
//! let mut session = Session::new(client, registry, &Models::default(), console).unwrap();
//! session.run(None).unwrap();
//! ```
//!
//! Agents are plain [`Agent`] implementations over a cloneable state, so the
//! same [`Runner`] can drive other pipelines:
//!
//! ```rust
//! use tofumatic::{Agent, Ctx, Outcome, Runner, TurnResult, Workflow};
//! # use tofumatic::{Banner, Console, ConsoleError};
//! # struct Quiet;
//! # impl Console for Quiet {
//! #     fn fragment(&mut self, _: &str) {}
//! #     fn end_stream(&mut self) {}
//! #     fn banner(&mut self, _: Banner, _: &str) {}
//! #     fn read_line(&mut self, _: &str) -> Result<Option<String>, ConsoleError> { Ok(None) }
//! # }
//!
//! #[derive(Clone)]
//! struct State { n: i32 }
//!
//! struct AddOne;
//! impl Agent<State> for AddOne {
//!     fn name(&self) -> &'static str { "add_one" }
//!     fn run(&mut self, state: State, _ctx: &mut Ctx) -> TurnResult<State> {
//!         Ok((State { n: state.n + 1 }, Outcome::Done))
//!     }
//! }
//!
//! let mut ctx = Ctx::new(Quiet);
//! let wf = Workflow::builder("demo").register(AddOne).build().unwrap();
//! let result = Runner::new(wf).run(State { n: 0 }, &mut ctx).unwrap();
//! assert_eq!(result.n, 1);
//! ```

mod agent;
pub mod agents;
pub mod cli;
pub mod config;
pub mod console;
mod ctx;
pub mod history;
pub mod llm;
pub mod parse;
pub mod plan;
pub mod prompts;
pub mod retry;
mod runner;
pub mod session;
pub mod tools;
mod workflow;

pub use agent::{Agent, AgentError, Outcome, TurnResult};
pub use agents::{InfrastructureEngineer, PlanningAgent, PromptAgent, Refinement, SessionState, Verdict};
pub use config::{Config, ConfigError, Models};
pub use console::{Banner, Console, ConsoleError, Terminal};
pub use ctx::Ctx;
pub use history::ConversationHistory;
pub use llm::{ChatClient, LlmError, OpenAiClient};
pub use plan::{Plan, Step, StepStatus};
pub use retry::RetryPolicy;
pub use runner::{ErrorEvent, PhaseEvent, Runner};
pub use session::Session;
pub use tools::{Tool, ToolError, ToolRegistry};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowError};
