//! Strategy tester input files.
//!
//! The terminal reads a settings file (`<name>.conf`, passed on the command
//! line) and an expert parameter file (`<name>.set`, referenced from the
//! settings file). Both live in `<dataPath>/tester/` and are flat
//! `Key=Value` text with LF line endings.
//!
//! The `.set` format has no schema: every non-text parameter must carry the
//! `,F`/`,1`/`,2`/`,3` optimization sub-fields, even when unused. Text
//! parameters in a plain backtest are the only ones without them.

use crate::domain::request::{ParamValue, Parameter, RunMode, RunRequest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TESTER_DIR: &str = "tester";
const DATE_FORMAT: &str = "%Y.%m.%d";

/// Paths of the two files written for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TesterFiles {
    pub data_path: PathBuf,
    pub settings: PathBuf,
    pub parameters: PathBuf,
}

impl TesterFiles {
    pub fn locate(data_path: &Path, strategy_name: &str) -> Self {
        let dir = data_path.join(TESTER_DIR);
        Self {
            data_path: data_path.to_path_buf(),
            settings: dir.join(format!("{strategy_name}.conf")),
            parameters: dir.join(format!("{strategy_name}.set")),
        }
    }
}

pub fn render_settings(request: &RunRequest, mode: RunMode) -> String {
    let name = request.strategy_name();
    // The terminal stays resident without this and never exits.
    let shutdown_terminal = true;

    let lines = [
        ("TestExpert", request.expert.clone()),
        ("TestExpertParameters", format!("{name}.set")),
        ("TestSymbol", request.symbol.clone()),
        ("TestPeriod", request.period.clone()),
        ("TestModel", request.model.to_string()),
        ("TestSpread", request.spread.to_string()),
        ("TestOptimization", mode.optimization_enabled().to_string()),
        ("TestDateEnable", true.to_string()),
        ("TestFromDate", request.from_date.format(DATE_FORMAT).to_string()),
        ("TestToDate", request.to_date.format(DATE_FORMAT).to_string()),
        ("TestReport", name.to_string()),
        ("TestReplaceReport", request.replace_report.to_string()),
        ("TestShutdownTerminal", shutdown_terminal.to_string()),
    ];

    let mut out = String::new();
    for (key, value) in lines {
        out.push_str(&format!("{key}={value}\n"));
    }
    out
}

pub fn render_parameters(parameters: &[Parameter], mode: RunMode) -> String {
    let mut out = String::new();
    for p in parameters {
        render_parameter(&mut out, p, mode);
    }
    out
}

fn render_parameter(out: &mut String, p: &Parameter, mode: RunMode) {
    let key = &p.name;
    out.push_str(&format!("{key}={}\n", p.value));

    match (&p.value, mode) {
        (
            ParamValue::Numeric {
                value,
                range: Some(range),
            },
            RunMode::Optimization,
        ) => {
            out.push_str(&format!("{key},F=1\n"));
            out.push_str(&format!("{key},1={value}\n"));
            out.push_str(&format!("{key},2={}\n", range.interval));
            out.push_str(&format!("{key},3={}\n", range.max));
        }
        (_, RunMode::Optimization) => push_unused_range(out, key),
        (ParamValue::Text(_), RunMode::Backtest) => {}
        (_, RunMode::Backtest) => push_unused_range(out, key),
    }
}

fn push_unused_range(out: &mut String, key: &str) {
    out.push_str(&format!("{key},F=0\n"));
    out.push_str(&format!("{key},1=0\n"));
    out.push_str(&format!("{key},2=0\n"));
    out.push_str(&format!("{key},3=0\n"));
}

/// Writes both files for `request` into `<data_path>/tester/`, overwriting any
/// left over from a previous run with the same strategy name.
pub fn write_tester_files(
    data_path: &Path,
    request: &RunRequest,
    mode: RunMode,
) -> std::io::Result<TesterFiles> {
    let files = TesterFiles::locate(data_path, request.strategy_name());

    fs::write(&files.settings, render_settings(request, mode))?;
    debug!(path = %files.settings.display(), "wrote settings file");

    fs::write(&files.parameters, render_parameters(&request.parameters, mode))?;
    debug!(path = %files.parameters.display(), "wrote parameter file");

    Ok(files)
}

/// Splits `Key=Value` lines, in file order. Lines without `=` are skipped.
pub fn parse_key_values(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
