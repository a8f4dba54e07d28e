//! Terminal command line and exit-status classification.

use crate::domain::error::TesterError;
use crate::domain::request::DataDirMode;
use std::path::{Path, PathBuf};

/// Command-line switch that keeps terminal data next to the binary.
pub const PORTABLE_SWITCH: &str = "/portable";

pub const EXIT_OK: i32 = 0;

/// terminal.exe exits with 3 after some completed tester runs. This is an
/// observed quirk of that one executable, not a general success convention.
pub const TERMINAL_EXIT_BENIGN: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl TerminalCommand {
    /// `"<exe>" [/portable] "<settings file>"`.
    pub fn for_settings(executable: &Path, mode: DataDirMode, settings: &Path) -> Self {
        let mut args = Vec::new();
        if mode == DataDirMode::Isolated {
            args.push(PORTABLE_SWITCH.to_string());
        }
        args.push(settings.display().to_string());
        Self {
            program: executable.to_path_buf(),
            args,
        }
    }

    /// Printable form with the program and path arguments quoted.
    pub fn command_line(&self) -> String {
        let mut line = format!("\"{}\"", self.program.display());
        for arg in &self.args {
            if arg == PORTABLE_SWITCH {
                line.push_str(&format!(" {arg}"));
            } else {
                line.push_str(&format!(" \"{arg}\""));
            }
        }
        line
    }
}

/// Maps a finished terminal's exit code to success or `Execution`.
pub fn classify_exit(command: &TerminalCommand, code: Option<i32>) -> Result<(), TesterError> {
    match code {
        Some(EXIT_OK) | Some(TERMINAL_EXIT_BENIGN) => Ok(()),
        _ => Err(TesterError::Execution {
            command: command.command_line(),
            code,
        }),
    }
}
