use std::collections::HashMap;

use thiserror::Error;

use crate::Agent;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("duplicate agent name: {0}")]
    DuplicateAgent(&'static str),
    #[error("unknown phase: {0}")]
    UnknownPhase(&'static str),
    #[error("phase chained twice: {0}")]
    RepeatedPhase(&'static str),
    #[error("workflow missing start phase")]
    MissingStart,
}

/// Collects agents and the order they run in.
///
/// `start_at` names the first phase and each `then` appends one more. Without
/// `start_at`, the first registered agent starts the chain.
pub struct WorkflowBuilder<S: Clone + 'static> {
    name: &'static str,
    agents: Vec<Box<dyn Agent<S>>>,
    chain: Vec<&'static str>,
    duplicate: Option<&'static str>,
}

impl<S: Clone + 'static> WorkflowBuilder<S> {
    pub fn register<A: Agent<S>>(mut self, agent: A) -> Self {
        let name = agent.name();
        if self.agents.iter().any(|a| a.name() == name) {
            self.duplicate.get_or_insert(name);
        }
        self.agents.push(Box::new(agent));
        self
    }

    pub fn start_at(mut self, phase: &'static str) -> Self {
        self.chain.clear();
        self.chain.push(phase);
        self
    }

    pub fn then(mut self, next: &'static str) -> Self {
        if self.chain.is_empty()
            && let Some(first) = self.agents.first()
        {
            self.chain.push(first.name());
        }
        self.chain.push(next);
        self
    }

    pub fn build(mut self) -> Result<Workflow<S>, WorkflowError> {
        if let Some(name) = self.duplicate {
            return Err(WorkflowError::DuplicateAgent(name));
        }
        if self.chain.is_empty() {
            let first = self.agents.first().ok_or(WorkflowError::MissingStart)?;
            self.chain.push(first.name());
        }

        let index: HashMap<&'static str, usize> =
            self.agents.iter().enumerate().map(|(i, a)| (a.name(), i)).collect();

        let mut next = HashMap::new();
        for (position, &phase) in self.chain.iter().enumerate() {
            if !index.contains_key(phase) {
                return Err(WorkflowError::UnknownPhase(phase));
            }
            if self.chain[..position].contains(&phase) {
                return Err(WorkflowError::RepeatedPhase(phase));
            }
            if let Some(&following) = self.chain.get(position + 1) {
                next.insert(phase, following);
            }
        }

        Ok(Workflow {
            name: self.name,
            agents: self.agents,
            index,
            chain: self.chain,
            next,
        })
    }
}

/// A validated chain of phases. Only built through [`Workflow::builder`].
pub struct Workflow<S: Clone + 'static> {
    name: &'static str,
    agents: Vec<Box<dyn Agent<S>>>,
    index: HashMap<&'static str, usize>,
    chain: Vec<&'static str>,
    next: HashMap<&'static str, &'static str>,
}

impl<S: Clone + 'static> Workflow<S> {
    pub fn builder(name: &'static str) -> WorkflowBuilder<S> {
        WorkflowBuilder {
            name,
            agents: Vec::new(),
            chain: Vec::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Phase names in the order they run.
    pub fn phases(&self) -> &[&'static str] {
        &self.chain
    }

    pub(crate) fn start(&self) -> &'static str {
        self.chain[0]
    }

    pub(crate) fn agent_mut(&mut self, name: &str) -> Option<&mut Box<dyn Agent<S>>> {
        let i = *self.index.get(name)?;
        self.agents.get_mut(i)
    }

    pub(crate) fn default_next(&self, from: &str) -> Option<&'static str> {
        self.next.get(from).copied()
    }
}
