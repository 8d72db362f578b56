//! Plans and their steps
//!
//! A [`Plan`] is the ordered step list produced by the planning agent. Order is
//! execution order; dependencies between steps are implied by position only.
//! Completion is carried on the step text itself as a trailing `Completed`
//! marker, which is also the form the planning prompt uses when it revises a plan.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::parse::strip_code_fences;

/// Trailing marker on a step description once the step has been carried out.
pub const COMPLETED_MARKER: &str = "Completed";

/// One unit of planned work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step number as given by the model. Not checked for uniqueness or order.
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any other keys the model produced, passed back verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Completed,
    Error,
}

impl Step {
    pub fn new(step: u64, description: impl Into<String>, tool: Option<&str>) -> Self {
        Self {
            step,
            description: description.into(),
            tool: tool.map(str::to_string),
            error: None,
            extra: Map::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.description.trim_end().ends_with(COMPLETED_MARKER)
    }

    pub fn status(&self) -> StepStatus {
        if self.is_completed() {
            StepStatus::Completed
        } else if self.error.is_some() {
            StepStatus::Error
        } else {
            StepStatus::Pending
        }
    }

    /// Completed and errored steps are never dispatched again.
    pub fn is_terminal(&self) -> bool {
        self.status() != StepStatus::Pending
    }

    pub fn mark_completed(&mut self) {
        if !self.is_completed() {
            let trimmed_len = self.description.trim_end().len();
            self.description.truncate(trimmed_len);
            self.description.push(' ');
            self.description.push_str(COMPLETED_MARKER);
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

impl fmt::Display for Step {
    /// `Step <n>: <description> Tool: <tool>[ Error: <message>]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.step, self.description)?;
        if let Some(tool) = &self.tool {
            write!(f, " Tool: {tool}")?;
        }
        if let Some(error) = &self.error {
            write!(f, " Error: {error}")?;
        }
        Ok(())
    }
}

/// Ordered list of steps produced once per user request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Read a plan out of the planning agent's raw reply.
    ///
    /// Anything that is not a JSON array yields an empty plan. Array elements
    /// that are not step-shaped objects are dropped with a warning; the rest
    /// keep their original order.
    pub fn from_model_output(output: &str) -> Self {
        let body = strip_code_fences(output);
        if body.is_empty() {
            warn!("Empty response from code_planning_agent");
            return Self::default();
        }

        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                error!("Invalid JSON format from code_planning_agent: {e}");
                error!("Raw response: {}...", body.chars().take(500).collect::<String>());
                return Self::default();
            }
        };

        let Value::Array(items) = value else {
            error!("Expected a list but got {} from code_planning_agent", kind(&value));
            return Self::default();
        };

        let mut steps = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                warn!("Step {i} is not a dictionary, skipping: {item}");
                continue;
            }
            match serde_json::from_value::<Step>(item) {
                Ok(step) => steps.push(step),
                Err(e) => warn!("Step {i} does not have the shape of a step, skipping: {e}"),
            }
        }

        info!("code_planning_agent produced {} valid steps", steps.len());
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status() == status).count()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
