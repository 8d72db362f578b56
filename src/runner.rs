use crate::{AgentError, Ctx, Outcome, Workflow};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Passed to the `on_phase` hook after each successful agent phase.
pub struct PhaseEvent<'a> {
    pub agent: &'a str,
    pub outcome: &'a Outcome,
    pub duration: Duration,
    pub phase_number: usize,
}

/// Passed to the `on_error` hook when a phase errors or continues past the end of the chain.
pub struct ErrorEvent<'a> {
    pub agent: &'a str,
    pub error: &'a AgentError,
    pub phase_number: usize,
}

pub struct Runner<S: Clone + 'static> {
    wf: Workflow<S>,
    on_phase: Option<Box<dyn FnMut(&PhaseEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl<S: Clone + 'static> Runner<S> {
    pub fn new(wf: Workflow<S>) -> Self {
        Self {
            wf,
            on_phase: None,
            on_error: None,
        }
    }

    /// Register a callback that fires after each successful agent phase.
    pub fn on_phase(mut self, cb: impl FnMut(&PhaseEvent) + 'static) -> Self {
        self.on_phase = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a phase errors.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to write phase transitions and errors to the log.
    pub fn with_tracing(self) -> Self {
        self.on_phase(|e| {
            debug!(
                phase = e.phase_number,
                agent = e.agent,
                outcome = ?e.outcome,
                secs = e.duration.as_secs_f64(),
                "phase finished"
            );
        })
        .on_error(|e| {
            error!(phase = e.phase_number, agent = e.agent, "{}", e.error);
        })
    }

    /// Run the chain from its first phase until a phase returns
    /// [`Outcome::Done`]. Chains never repeat a phase, so this ends after at
    /// most one pass.
    pub fn run(&mut self, mut state: S, ctx: &mut Ctx) -> Result<S, AgentError> {
        let mut current = self.wf.start();
        let mut phase_number: usize = 0;

        loop {
            phase_number += 1;

            let agent = self
                .wf
                .agent_mut(current)
                .ok_or_else(|| AgentError::other(format!("unknown phase: {current}")))?;

            let start = Instant::now();
            let result = agent.run(state.clone(), ctx);
            let duration = start.elapsed();

            let (next_state, outcome) = match result {
                Ok(ok) => ok,
                Err(err) => {
                    self.emit_error(current, &err, phase_number);
                    return Err(err);
                }
            };

            if let Some(cb) = &mut self.on_phase {
                cb(&PhaseEvent {
                    agent: current,
                    outcome: &outcome,
                    duration,
                    phase_number,
                });
            }

            state = next_state;

            match outcome {
                Outcome::Done => return Ok(state),
                Outcome::Continue => match self.wf.default_next(current) {
                    Some(next) => current = next,
                    None => {
                        let err = AgentError::other(format!(
                            "phase '{current}' returned Continue at the end of workflow {}",
                            self.wf.name()
                        ));
                        self.emit_error(current, &err, phase_number);
                        return Err(err);
                    }
                },
            }
        }
    }

    fn emit_error(&mut self, agent: &str, error: &AgentError, phase_number: usize) {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                agent,
                error,
                phase_number,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::mock::MockConsole;
    use crate::{Agent, Outcome, TurnResult, Workflow};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct S(u32);

    fn ctx() -> Ctx {
        Ctx::new(MockConsole::new())
    }

    struct AddOne(&'static str, Outcome);
    impl Agent<S> for AddOne {
        fn name(&self) -> &'static str {
            self.0
        }
        fn run(&mut self, state: S, _ctx: &mut Ctx) -> TurnResult<S> {
            Ok((S(state.0 + 1), self.1.clone()))
        }
    }

    struct FailingAgent;
    impl Agent<S> for FailingAgent {
        fn name(&self) -> &'static str {
            "failing_agent"
        }
        fn run(&mut self, _state: S, _ctx: &mut Ctx) -> TurnResult<S> {
            Err(AgentError::other("boom"))
        }
    }

    #[test]
    fn continue_follows_chain_until_done() {
        let wf = Workflow::builder("test")
            .register(AddOne("a", Outcome::Continue))
            .register(AddOne("b", Outcome::Continue))
            .register(AddOne("c", Outcome::Done))
            .start_at("a")
            .then("b")
            .then("c")
            .build()
            .unwrap();

        let result = Runner::new(wf).run(S(0), &mut ctx()).unwrap();
        assert_eq!(result.0, 3);
    }

    #[test]
    fn done_stops_early() {
        let wf = Workflow::builder("test")
            .register(AddOne("a", Outcome::Done))
            .register(AddOne("b", Outcome::Done))
            .start_at("a")
            .then("b")
            .build()
            .unwrap();

        let result = Runner::new(wf).run(S(0), &mut ctx()).unwrap();
        assert_eq!(result.0, 1);
    }

    // --- hooks ---

    #[test]
    fn on_phase_fires_per_phase() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let wf = Workflow::builder("test")
            .register(AddOne("a", Outcome::Continue))
            .register(AddOne("b", Outcome::Done))
            .start_at("a")
            .then("b")
            .build()
            .unwrap();

        let mut runner = Runner::new(wf).on_phase(move |e| {
            sink.borrow_mut().push((e.agent.to_string(), e.phase_number));
        });
        runner.run(S(0), &mut ctx()).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn on_error_fires_on_agent_error() {
        let count = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&count);

        let wf = Workflow::builder("test")
            .register(FailingAgent)
            .build()
            .unwrap();

        let mut runner = Runner::new(wf).on_error(move |_e| {
            *counter.borrow_mut() += 1;
        });

        let err = runner.run(S(0), &mut ctx()).err().unwrap();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn continue_without_default_next_errors() {
        let wf = Workflow::builder("test")
            .register(AddOne("a", Outcome::Continue))
            .build()
            .unwrap();

        let err = Runner::new(wf).run(S(0), &mut ctx()).err().unwrap();
        assert!(err.to_string().contains("returned Continue at the end of workflow test"));
    }
}
