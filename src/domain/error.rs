//! Domain error types.

use std::path::PathBuf;

/// Top-level error type for mt4tester.
#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    #[error("terminal [{alias}] is not initialized")]
    NotInitialized { alias: String },

    #[error("install path {} does not exist", .path.display())]
    PathNotFound { path: PathBuf },

    #[error("no data directory under {} belongs to {}", .root.display(), .install_path.display())]
    Resolution { install_path: PathBuf, root: PathBuf },

    #[error("per-user data root is unknown (set APPDATA or [terminal] data_root)")]
    DataRootUnavailable,

    #[error("data path {} is missing required directories: {}", .data_path.display(), .missing.join(", "))]
    InvalidInstallation {
        data_path: PathBuf,
        missing: Vec<String>,
    },

    #[error("terminal command [{command}] failed with {}", describe_exit(.code))]
    Execution { command: String, code: Option<i32> },

    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<&TesterError> for std::process::ExitCode {
    fn from(err: &TesterError) -> Self {
        let code: u8 = match err {
            TesterError::Io(_) | TesterError::Spawn { .. } => 1,
            TesterError::ConfigParse { .. }
            | TesterError::ConfigMissing { .. }
            | TesterError::ConfigInvalid { .. } => 2,
            TesterError::NotInitialized { .. }
            | TesterError::PathNotFound { .. }
            | TesterError::Resolution { .. }
            | TesterError::DataRootUnavailable
            | TesterError::InvalidInstallation { .. } => 3,
            TesterError::Execution { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
