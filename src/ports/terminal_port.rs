//! Terminal process port trait.

use crate::domain::error::TesterError;
use crate::domain::terminal::TerminalCommand;

/// Launches the terminal and blocks until it exits.
pub trait TerminalPort {
    /// Returns the raw exit code, or `None` if the process ended without one.
    fn execute(&self, command: &TerminalCommand) -> Result<Option<i32>, TesterError>;
}
