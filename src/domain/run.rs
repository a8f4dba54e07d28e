//! Backtest and optimization runs.
//!
//! A run resolves the installation, writes the tester files, launches the
//! terminal with the settings file and waits for it to exit. Nothing is rolled
//! back on failure; the next run with the same strategy name overwrites the
//! files.

use crate::domain::error::TesterError;
use crate::domain::registry::Registry;
use crate::domain::report::ReportHandle;
use crate::domain::request::{RunMode, RunRequest};
use crate::domain::terminal::{classify_exit, TerminalCommand};
use crate::domain::tester_files::{write_tester_files, TesterFiles};
use crate::ports::terminal_port::TerminalPort;
use tracing::{error, info};

/// Resolves the data directory for `alias` and writes both tester files.
pub fn prepare(
    registry: &mut Registry,
    alias: &str,
    request: &RunRequest,
    mode: RunMode,
) -> Result<TesterFiles, TesterError> {
    let data_path = registry.resolve(alias, request.data_dir_mode())?;
    Ok(write_tester_files(&data_path, request, mode)?)
}

/// Runs a single backtest. Returns a report handle if `read_report` is set.
pub fn run_backtest(
    registry: &mut Registry,
    alias: &str,
    request: &RunRequest,
    terminal: &dyn TerminalPort,
) -> Result<Option<ReportHandle>, TesterError> {
    execute(registry, alias, request, terminal, RunMode::Backtest)
}

/// Runs an optimization over the parameters' ranges.
pub fn run_optimization(
    registry: &mut Registry,
    alias: &str,
    request: &RunRequest,
    terminal: &dyn TerminalPort,
) -> Result<Option<ReportHandle>, TesterError> {
    execute(registry, alias, request, terminal, RunMode::Optimization)
}

fn execute(
    registry: &mut Registry,
    alias: &str,
    request: &RunRequest,
    terminal: &dyn TerminalPort,
    mode: RunMode,
) -> Result<Option<ReportHandle>, TesterError> {
    let files = prepare(registry, alias, request, mode)?;
    let executable = registry.installation(alias)?.executable();

    let command =
        TerminalCommand::for_settings(&executable, request.data_dir_mode(), &files.settings);
    info!(
        alias,
        strategy = request.strategy_name(),
        ?mode,
        "starting terminal: {}",
        command.command_line()
    );

    let code = terminal.execute(&command)?;
    classify_exit(&command, code).inspect_err(|e| error!("{e}"))?;
    info!(alias, ?code, "terminal finished");

    if request.read_report {
        Ok(Some(ReportHandle::new(mode.into(), request, &files.data_path)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::data_dir::REQUIRED_SUBDIRS;
    use crate::domain::registry::DEFAULT_ALIAS;
    use crate::domain::request::{ParamValue, Parameter, TestModel};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;

    /// Records whether both tester files existed when the terminal was launched.
    struct FileCheckingTerminal {
        code: Option<i32>,
        seen: RefCell<Vec<(TerminalCommand, bool)>>,
    }

    impl TerminalPort for FileCheckingTerminal {
        fn execute(&self, command: &TerminalCommand) -> Result<Option<i32>, TesterError> {
            let settings = Path::new(command.args.last().unwrap());
            let set = settings.with_extension("set");
            let ready = settings.is_file() && set.is_file();
            self.seen.borrow_mut().push((command.clone(), ready));
            Ok(self.code)
        }
    }

    fn terminal(code: i32) -> FileCheckingTerminal {
        FileCheckingTerminal {
            code: Some(code),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn isolated_install() -> (tempfile::TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        for parts in REQUIRED_SUBDIRS {
            let sub = parts.iter().fold(dir.path().to_path_buf(), |p, part| p.join(part));
            fs::create_dir_all(sub).unwrap();
        }
        let mut registry = Registry::new(None);
        registry.initialize(DEFAULT_ALIAS, dir.path());
        (dir, registry)
    }

    fn request(read_report: bool) -> RunRequest {
        RunRequest {
            expert: "SampleEA".into(),
            parameters: vec![Parameter {
                name: "Lots".into(),
                value: ParamValue::optimized(0.1, 0.1, 1.0),
            }],
            symbol: "USDJPY".into(),
            period: "M5".into(),
            from_date: NaiveDate::from_ymd_opt(2014, 9, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2015, 1, 5).unwrap(),
            model: TestModel::EveryTick,
            spread: 5,
            replace_report: false,
            read_report,
            use_isolated_data_dir: true,
        }
    }

    #[test]
    fn files_are_written_before_launch() {
        let (dir, mut registry) = isolated_install();
        let term = terminal(0);
        run_backtest(&mut registry, DEFAULT_ALIAS, &request(false), &term).unwrap();

        let seen = term.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1);
        assert_eq!(seen[0].0.program, dir.path().join("terminal.exe"));
    }

    #[test]
    fn no_report_handle_when_not_requested() {
        let (_dir, mut registry) = isolated_install();
        let out = run_backtest(&mut registry, DEFAULT_ALIAS, &request(false), &terminal(3)).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn optimization_report_handle() {
        let (dir, mut registry) = isolated_install();
        let handle = run_optimization(&mut registry, DEFAULT_ALIAS, &request(true), &terminal(0))
            .unwrap()
            .unwrap();
        assert_eq!(handle.kind, crate::domain::report::ReportKind::Optimization);
        assert_eq!(handle.path(), dir.path().join("SampleEA.htm"));

        let set = fs::read_to_string(dir.path().join("tester").join("SampleEA.set")).unwrap();
        assert!(set.contains("Lots,F=1\n"));
    }

    #[test]
    fn failing_exit_code_propagates() {
        let (_dir, mut registry) = isolated_install();
        let err = run_backtest(&mut registry, DEFAULT_ALIAS, &request(true), &terminal(1)).unwrap_err();
        assert!(matches!(err, TesterError::Execution { code: Some(1), .. }));
    }

    #[test]
    fn prepare_writes_without_launching() {
        let (dir, mut registry) = isolated_install();
        let files = prepare(&mut registry, DEFAULT_ALIAS, &request(true), RunMode::Backtest).unwrap();
        assert_eq!(files.data_path, dir.path());
        assert_eq!(files.settings, dir.path().join("tester").join("SampleEA.conf"));
        assert!(files.parameters.is_file());
    }

    #[test]
    fn run_launches_the_prepared_settings_file() {
        let (_dir, mut registry) = isolated_install();
        let files = prepare(&mut registry, DEFAULT_ALIAS, &request(false), RunMode::Backtest).unwrap();
        let term = terminal(0);
        run_backtest(&mut registry, DEFAULT_ALIAS, &request(false), &term).unwrap();

        let seen = term.seen.borrow();
        let launched = seen[0].0.args.last().unwrap();
        assert_eq!(Path::new(launched), files.settings);
    }

    #[test]
    fn unknown_alias_writes_nothing() {
        let (dir, mut registry) = isolated_install();
        let term = terminal(0);
        let err = run_backtest(&mut registry, "other", &request(true), &term).unwrap_err();
        assert!(matches!(err, TesterError::NotInitialized { .. }));
        assert!(term.seen.borrow().is_empty());
        assert!(!dir.path().join("tester").join("SampleEA.conf").exists());
    }
}
