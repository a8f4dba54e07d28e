//! Run request model: what the strategy tester should do for one run.

use chrono::NaiveDate;
use std::fmt;

/// Tick generation model used by the strategy tester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestModel {
    EveryTick = 0,
    ControlPoints = 1,
    OpenPricesOnly = 2,
}

impl TestModel {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Accepts the numeric code or a snake_case name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "0" | "every_tick" => Some(TestModel::EveryTick),
            "1" | "control_points" => Some(TestModel::ControlPoints),
            "2" | "open_prices" | "open_prices_only" => Some(TestModel::OpenPricesOnly),
            _ => None,
        }
    }
}

impl fmt::Display for TestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Whether a run is a single backtest or a parameter optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Optimization,
}

impl RunMode {
    pub fn optimization_enabled(self) -> bool {
        matches!(self, RunMode::Optimization)
    }
}

/// Where the terminal keeps its working data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataDirMode {
    /// Per-user profile directory located through the marker file.
    PerUser,
    /// Data next to the binary (`/portable`).
    Isolated,
}

/// Optimization range for a numeric parameter. The start is the parameter's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationRange {
    pub interval: f64,
    pub max: f64,
}

/// Expert parameter value, with its kind fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Numeric {
        value: f64,
        range: Option<OptimizationRange>,
    },
    Boolean(bool),
    Text(String),
}

impl ParamValue {
    pub fn numeric(value: f64) -> Self {
        ParamValue::Numeric { value, range: None }
    }

    pub fn optimized(value: f64, interval: f64, max: f64) -> Self {
        ParamValue::Numeric {
            value,
            range: Some(OptimizationRange { interval, max }),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ParamValue::Text(_))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Numeric { value, .. } => write!(f, "{}", value),
            ParamValue::Boolean(b) => write!(f, "{}", b),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Expert path relative to `MQL4/Experts`, e.g. `Trend/SampleEA`.
    pub expert: String,
    /// Parameters in the order they are written to the `.set` file.
    pub parameters: Vec<Parameter>,
    pub symbol: String,
    pub period: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub model: TestModel,
    pub spread: u32,
    pub replace_report: bool,
    pub read_report: bool,
    pub use_isolated_data_dir: bool,
}

/// Last `/` or `\` separated component of an expert path.
pub fn strategy_name_of(expert: &str) -> &str {
    expert.rsplit(['/', '\\']).next().unwrap_or(expert)
}

impl RunRequest {
    /// Last component of the expert path; names the `.conf`, `.set` and report files.
    pub fn strategy_name(&self) -> &str {
        strategy_name_of(&self.expert)
    }

    pub fn data_dir_mode(&self) -> DataDirMode {
        if self.use_isolated_data_dir {
            DataDirMode::Isolated
        } else {
            DataDirMode::PerUser
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}
