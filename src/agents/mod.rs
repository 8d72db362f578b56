//! The three phases of a session turn
//!
//! [`PromptAgent`] refines the operator's request, [`PlanningAgent`] turns it
//! into a [`Plan`], and [`InfrastructureEngineer`] carries the plan out behind
//! the confirmation gate. Each is an [`Agent`](crate::Agent) over
//! [`SessionState`] so a [`Workflow`](crate::Workflow) can chain them.

mod engineer;
mod planner;
mod refiner;

pub use engineer::{CONFIRM_PROMPT, EngineerError, InfrastructureEngineer};
pub use planner::PlanningAgent;
pub use refiner::{PromptAgent, Refinement};

use crate::plan::Plan;

/// How a session turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Pending,
    /// The refiner judged the request unrelated to OpenTofu, or could not be read.
    Unrelated,
    /// No usable plan came back.
    NoPlan,
    /// The executor finished its pass.
    Succeeded,
    /// The executor hit a fatal error.
    Incomplete,
}

/// State threaded through the phases of one turn.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub input: String,
    /// Refined project description handed to the planner.
    pub description: String,
    pub plan: Plan,
    pub verdict: Verdict,
}

impl SessionState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }
}

/// First `max` characters of `text`, for log lines.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
