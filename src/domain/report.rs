//! Handle to the report the terminal writes after a run.
//!
//! Reading the report is left to the caller; the handle only pins down where
//! it lives, which is fixed by the data path and strategy name.

use crate::domain::request::{RunMode, RunRequest};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Backtest,
    Optimization,
}

impl From<RunMode> for ReportKind {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Backtest => ReportKind::Backtest,
            RunMode::Optimization => ReportKind::Optimization,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportHandle {
    pub kind: ReportKind,
    pub strategy_name: String,
    pub data_path: PathBuf,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl ReportHandle {
    pub fn new(kind: ReportKind, request: &RunRequest, data_path: &Path) -> Self {
        Self {
            kind,
            strategy_name: request.strategy_name().to_string(),
            data_path: data_path.to_path_buf(),
            from_date: request.from_date,
            to_date: request.to_date,
        }
    }

    /// `TestReport` is relative to the data directory; the terminal adds `.htm`.
    pub fn path(&self) -> PathBuf {
        self.data_path.join(format!("{}.htm", self.strategy_name))
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }
}
