//! Operator console: streamed output, status banners and line input

use std::io::{self, Write};

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console input closed")]
    Closed,
    #[error("readline error: {0}")]
    Readline(String),
}

/// Colour of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Plain,
    Info,
    Success,
    Warning,
    Error,
}

/// Everything the agents need from the operator's terminal.
pub trait Console {
    /// One streamed content fragment from the model.
    fn fragment(&mut self, text: &str);

    /// The current stream has ended.
    fn end_stream(&mut self);

    fn banner(&mut self, kind: Banner, message: &str);

    /// Read one line. `Ok(None)` means the operator interrupted (Ctrl-C);
    /// [`ConsoleError::Closed`] means input is gone for good.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ConsoleError>;
}

/// Interactive terminal backed by rustyline.
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self, ConsoleError> {
        let editor = DefaultEditor::new().map_err(|e| ConsoleError::Readline(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl Console for Terminal {
    fn fragment(&mut self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
    }

    fn end_stream(&mut self) {
        println!();
    }

    fn banner(&mut self, kind: Banner, message: &str) {
        match kind {
            Banner::Plain => println!("{message}"),
            Banner::Info => println!("{}", message.cyan()),
            Banner::Success => println!("{}", message.green()),
            Banner::Warning => println!("{}", message.yellow()),
            Banner::Error => println!("{}", message.red()),
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ConsoleError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => Ok(None),
            Err(ReadlineError::Eof) => Err(ConsoleError::Closed),
            Err(err) => Err(ConsoleError::Readline(err.to_string())),
        }
    }
}
