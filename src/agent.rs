use crate::ctx::Ctx;
use thiserror::Error;

/// The result of running one phase: a new state plus what to do next.
pub type TurnResult<S> = Result<(S, Outcome), AgentError>;

/// A sync agent that transforms session state one phase at a time.
///
/// Implement this trait on your own structs and register them into a
/// [`crate::Workflow`] to build a pipeline.
pub trait Agent<S>: 'static {
    /// A unique name for this agent, used for chaining with `.then()`.
    fn name(&self) -> &'static str;

    /// Run one phase. Returns the updated state and an [`Outcome`] that tells
    /// the runner what to do next.
    fn run(&mut self, state: S, ctx: &mut Ctx) -> TurnResult<S>;
}

/// Control flow for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Follow the workflow's default next phase (set via `.then()`).
    Continue,
    /// Turn complete, return the final state.
    Done,
}

/// Error type for agent phases, with variants designed around what the caller
/// can do about them.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Bad input or agent logic error. Don't retry, fix the code.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Everything else. Inspect the message for details.
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Create an [`Invalid`](AgentError::Invalid) error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        AgentError::Invalid(msg.into())
    }

    /// Create an [`Other`](AgentError::Other) error.
    pub fn other(msg: impl Into<String>) -> Self {
        AgentError::Other(msg.into())
    }
}
