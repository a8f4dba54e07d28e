//! Terminal adapter backed by `std::process`.
//!
//! The child inherits stdio and is waited on without a timeout: a terminal
//! that never exits blocks the caller.

use crate::domain::error::TesterError;
use crate::domain::terminal::TerminalCommand;
use crate::ports::terminal_port::TerminalPort;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminal;

impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl TerminalPort for ProcessTerminal {
    fn execute(&self, command: &TerminalCommand) -> Result<Option<i32>, TesterError> {
        debug!(cmd = %command.command_line(), "spawning terminal");
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|source| TesterError::Spawn {
                program: command.program.clone(),
                source,
            })?;
        debug!(?status, "terminal exited");
        Ok(status.code())
    }
}
