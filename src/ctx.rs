use tracing::info;

use crate::console::Console;

/// Execution context shared by the agents of one session: the operator's
/// console, the session counter and a trail of phase events.
pub struct Ctx {
    console: Box<dyn Console>,
    session: usize,
    log: Vec<String>,
}

impl Ctx {
    pub fn new(console: impl Console + 'static) -> Self {
        Self {
            console: Box::new(console),
            session: 0,
            log: vec![],
        }
    }

    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    /// Number of the session turn currently running (1-based, 0 before the first).
    pub fn session(&self) -> usize {
        self.session
    }

    pub fn begin_session(&mut self) -> usize {
        self.session += 1;
        self.session
    }

    /// Record a phase event. Events also go to the log file.
    pub fn log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!(session = self.session, "{msg}");
        self.log.push(msg);
    }

    pub fn logs(&self) -> &[String] {
        &self.log
    }

    pub fn clear_logs(&mut self) {
        self.log.clear();
    }
}
