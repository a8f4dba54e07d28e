//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::ini_config_adapter::IniConfigAdapter;
use crate::adapters::process_terminal::ProcessTerminal;
use crate::domain::config_validation::{parse_date, parse_param_value, parse_range, validate_job_config};
use crate::domain::error::TesterError;
use crate::domain::registry::{Registry, DEFAULT_ALIAS};
use crate::domain::request::{DataDirMode, ParamValue, Parameter, RunMode, RunRequest, TestModel};
use crate::domain::run::{run_backtest, run_optimization};
use crate::domain::tester_files::{render_parameters, render_settings};
use crate::ports::config_port::ConfigPort;
use crate::ports::terminal_port::TerminalPort;

#[derive(Parser, Debug)]
#[command(name = "mt4tester", about = "Run MetaTrader 4 strategy tester jobs")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a parameter optimization
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the data directory a terminal uses
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        isolated: bool,
    },
    /// Validate a job file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// `[terminal]` section of a job file.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalSettings {
    pub alias: String,
    pub install_path: PathBuf,
    pub data_root: Option<PathBuf>,
    pub isolated: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            alias,
            dry_run,
        } => run_job(&config, alias.as_deref(), RunMode::Backtest, dry_run),
        Command::Optimize {
            config,
            alias,
            dry_run,
        } => run_job(&config, alias.as_deref(), RunMode::Optimization, dry_run),
        Command::Resolve {
            config,
            alias,
            isolated,
        } => run_resolve(&config, alias.as_deref(), isolated),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<IniConfigAdapter, ExitCode> {
    IniConfigAdapter::from_file(path).map_err(|e| {
        let err = TesterError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Loads and validates a job file.
fn load_job(path: &PathBuf) -> Result<(TerminalSettings, RunRequest), ExitCode> {
    eprintln!("Loading job from {}", path.display());
    let adapter = load_config(path)?;
    let built = validate_job_config(&adapter)
        .and_then(|()| Ok((build_terminal_settings(&adapter)?, build_run_request(&adapter)?)));
    built.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

pub fn build_terminal_settings(config: &dyn ConfigPort) -> Result<TerminalSettings, TesterError> {
    let install_path = config
        .get_string("terminal", "install_path")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| TesterError::ConfigMissing {
            section: "terminal".into(),
            key: "install_path".into(),
        })?;

    Ok(TerminalSettings {
        alias: config
            .get_string("terminal", "alias")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ALIAS.to_string()),
        install_path: PathBuf::from(install_path),
        data_root: config.get_string("terminal", "data_root").map(PathBuf::from),
        isolated: config.get_bool("terminal", "isolated", false),
    })
}

pub fn build_run_request(config: &dyn ConfigPort) -> Result<RunRequest, TesterError> {
    let required = |key: &str| {
        config
            .get_string("test", key)
            .ok_or_else(|| TesterError::ConfigMissing {
                section: "test".into(),
                key: key.into(),
            })
    };

    let model = match config.get_string("test", "model") {
        None => TestModel::EveryTick,
        Some(s) => TestModel::parse(&s).ok_or_else(|| TesterError::ConfigInvalid {
            section: "test".into(),
            key: "model".into(),
            reason: format!("unknown model {s:?}"),
        })?,
    };

    let spread = config.get_int("test", "spread", 5);
    let spread = u32::try_from(spread).map_err(|_| TesterError::ConfigInvalid {
        section: "test".into(),
        key: "spread".into(),
        reason: "spread must be a non-negative integer".into(),
    })?;

    Ok(RunRequest {
        expert: required("expert")?,
        parameters: build_parameters(config)?,
        symbol: required("symbol")?,
        period: required("period")?,
        from_date: parse_date(config.get_string("test", "from_date").as_deref(), "from_date")?,
        to_date: parse_date(config.get_string("test", "to_date").as_deref(), "to_date")?,
        model,
        spread,
        replace_report: config.get_bool("test", "replace_report", true),
        read_report: config.get_bool("test", "read_report", true),
        use_isolated_data_dir: config.get_bool("terminal", "isolated", false),
    })
}

/// `[parameters]` in file order, with `[optimization]` ranges attached.
pub fn build_parameters(config: &dyn ConfigPort) -> Result<Vec<Parameter>, TesterError> {
    let ranges = config.entries("optimization");
    let mut parameters = Vec::new();

    for (name, raw) in config.entries("parameters") {
        let mut value = parse_param_value(&raw);
        if let Some((_, range)) = ranges.iter().find(|(k, _)| *k == name) {
            let invalid = |reason: &str| TesterError::ConfigInvalid {
                section: "optimization".into(),
                key: name.clone(),
                reason: reason.into(),
            };
            let (interval, max) =
                parse_range(range).ok_or_else(|| invalid("expected \"<interval>, <max>\""))?;
            value = match value {
                ParamValue::Numeric { value, .. } => ParamValue::optimized(value, interval, max),
                _ => return Err(invalid("only numeric parameters can be optimized")),
            };
        }
        parameters.push(Parameter { name, value });
    }
    Ok(parameters)
}

/// Registers the job's install path under `alias`, which is `--alias` when
/// given and the job file's alias otherwise.
pub fn build_registry(settings: &TerminalSettings, alias: &str) -> Registry {
    let mut registry = match &settings.data_root {
        Some(root) => Registry::new(Some(root.clone())),
        None => Registry::from_env(),
    };
    registry.initialize(alias, settings.install_path.clone());
    registry
}

fn run_job(
    config_path: &PathBuf,
    alias_override: Option<&str>,
    mode: RunMode,
    dry_run: bool,
) -> ExitCode {
    let (settings, request) = match load_job(config_path) {
        Ok(job) => job,
        Err(code) => return code,
    };

    if dry_run {
        print_dry_run(&request, mode);
        return ExitCode::SUCCESS;
    }

    let alias = alias_override.unwrap_or(&settings.alias);
    let mut registry = build_registry(&settings, alias);
    run_job_pipeline(&mut registry, alias, &request, mode, &ProcessTerminal::new())
}

fn print_dry_run(request: &RunRequest, mode: RunMode) {
    let name = request.strategy_name();
    println!("# {name}.conf");
    print!("{}", render_settings(request, mode));
    println!("# {name}.set");
    print!("{}", render_parameters(&request.parameters, mode));
    eprintln!("\nDry run complete: nothing written");
}

/// Runs one job against `registry` and reports the outcome on stdout/stderr.
pub fn run_job_pipeline(
    registry: &mut Registry,
    alias: &str,
    request: &RunRequest,
    mode: RunMode,
    terminal: &dyn TerminalPort,
) -> ExitCode {
    let label = match mode {
        RunMode::Backtest => "backtest",
        RunMode::Optimization => "optimization",
    };
    eprintln!(
        "Running {} of {} on {} {} ({} to {}) with terminal [{}]",
        label,
        request.expert,
        request.symbol,
        request.period,
        request.from_date,
        request.to_date,
        alias,
    );

    let result = match mode {
        RunMode::Backtest => run_backtest(registry, alias, request, terminal),
        RunMode::Optimization => run_optimization(registry, alias, request, terminal),
    };

    match result {
        Ok(Some(report)) => {
            println!("{}", report.path().display());
            if report.exists() {
                eprintln!("Report written to: {}", report.path().display());
            } else {
                eprintln!("warning: report not found at {}", report.path().display());
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("Terminal finished; report reading disabled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_resolve(config_path: &PathBuf, alias_override: Option<&str>, isolated: bool) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match build_terminal_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mode = if isolated || settings.isolated {
        DataDirMode::Isolated
    } else {
        DataDirMode::PerUser
    };
    let alias = alias_override.unwrap_or(&settings.alias);
    let mut registry = build_registry(&settings, alias);

    match registry.resolve(alias, mode) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (settings, request) = match load_job(config_path) {
        Ok(job) => job,
        Err(code) => return code,
    };

    eprintln!("\nTerminal [{}]:", settings.alias);
    eprintln!("  install_path: {}", settings.install_path.display());
    if let Some(root) = &settings.data_root {
        eprintln!("  data_root:    {}", root.display());
    }
    eprintln!("  isolated:     {}", settings.isolated);

    eprintln!("\nTest:");
    eprintln!("  expert:  {} ({})", request.expert, request.strategy_name());
    eprintln!("  symbol:  {} {}", request.symbol, request.period);
    eprintln!("  dates:   {} to {}", request.from_date, request.to_date);
    eprintln!("  model:   {:?}", request.model);
    eprintln!("  spread:  {}", request.spread);

    eprintln!("\nParameters:");
    for p in &request.parameters {
        match &p.value {
            ParamValue::Numeric {
                value,
                range: Some(range),
            } => eprintln!(
                "  {} = {} (optimize {} to {} step {})",
                p.name, value, value, range.max, range.interval
            ),
            other => eprintln!("  {} = {}", p.name, other),
        }
    }

    eprintln!("\nJob file is valid.");
    ExitCode::SUCCESS
}
