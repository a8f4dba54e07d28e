//! Job file validation.
//!
//! Validates every field before any file is written or the terminal started.

use crate::domain::error::TesterError;
use crate::domain::request::{strategy_name_of, ParamValue, TestModel};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_job_config(config: &dyn ConfigPort) -> Result<(), TesterError> {
    validate_required(config, "terminal", "install_path")?;
    validate_required(config, "test", "expert")?;
    validate_expert(config)?;
    validate_required(config, "test", "symbol")?;
    validate_required(config, "test", "period")?;
    validate_dates(config)?;
    validate_model(config)?;
    validate_spread(config)?;
    validate_flag(config, "terminal", "isolated")?;
    validate_flag(config, "test", "replace_report")?;
    validate_flag(config, "test", "read_report")?;
    validate_optimization(config)?;
    Ok(())
}

fn validate_required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TesterError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TesterError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_expert(config: &dyn ConfigPort) -> Result<(), TesterError> {
    let expert = config.get_string("test", "expert").unwrap_or_default();
    if strategy_name_of(expert.trim()).trim().is_empty() {
        return Err(TesterError::ConfigInvalid {
            section: "test".to_string(),
            key: "expert".to_string(),
            reason: format!("{expert:?} does not end in an expert name"),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TesterError> {
    let from = parse_date(config.get_string("test", "from_date").as_deref(), "from_date")?;
    let to = parse_date(config.get_string("test", "to_date").as_deref(), "to_date")?;

    if from > to {
        return Err(TesterError::ConfigInvalid {
            section: "test".to_string(),
            key: "from_date".to_string(),
            reason: "from_date must not be after to_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TesterError> {
    match value {
        None => Err(TesterError::ConfigMissing {
            section: "test".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TesterError::ConfigInvalid {
                section: "test".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_model(config: &dyn ConfigPort) -> Result<(), TesterError> {
    match config.get_string("test", "model") {
        None => Ok(()),
        Some(s) if TestModel::parse(&s).is_some() => Ok(()),
        Some(_) => Err(TesterError::ConfigInvalid {
            section: "test".to_string(),
            key: "model".to_string(),
            reason: "model must be 0, 1, 2, every_tick, control_points or open_prices"
                .to_string(),
        }),
    }
}

fn validate_spread(config: &dyn ConfigPort) -> Result<(), TesterError> {
    let Some(raw) = config.get_string("test", "spread") else {
        return Ok(());
    };
    match raw.trim().parse::<u32>() {
        Ok(_) => Ok(()),
        Err(_) => Err(TesterError::ConfigInvalid {
            section: "test".to_string(),
            key: "spread".to_string(),
            reason: "spread must be a non-negative integer".to_string(),
        }),
    }
}

fn validate_flag(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TesterError> {
    match config.get_string(section, key) {
        Some(raw) if parse_flag(&raw).is_none() => Err(TesterError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{raw:?} is not one of true, false, yes, no, 1, 0"),
        }),
        _ => Ok(()),
    }
}

/// Reads a job-file switch; case-insensitive.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Splits an `<interval>, <max>` optimization range.
pub fn parse_range(raw: &str) -> Option<(f64, f64)> {
    let (interval, max) = raw.split_once(',')?;
    let interval: f64 = interval.trim().parse().ok()?;
    let max: f64 = max.trim().parse().ok()?;
    Some((interval, max))
}

/// Decides a parameter's kind from its job-file text.
///
/// `true`/`false` are booleans, anything `f64` accepts is numeric, and the
/// rest is text. Double quotes force text and are stripped.
pub fn parse_param_value(raw: &str) -> ParamValue {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return ParamValue::text(&raw[1..raw.len() - 1]);
    }
    match raw {
        "true" => ParamValue::Boolean(true),
        "false" => ParamValue::Boolean(false),
        _ => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => ParamValue::numeric(v),
            _ => ParamValue::text(raw),
        },
    }
}

fn validate_optimization(config: &dyn ConfigPort) -> Result<(), TesterError> {
    let parameters = config.entries("parameters");
    for (name, raw) in config.entries("optimization") {
        let invalid = |reason: &str| TesterError::ConfigInvalid {
            section: "optimization".to_string(),
            key: name.clone(),
            reason: reason.to_string(),
        };

        let (interval, _max) =
            parse_range(&raw).ok_or_else(|| invalid("expected \"<interval>, <max>\""))?;
        if interval <= 0.0 {
            return Err(invalid("interval must be positive"));
        }

        match parameters.iter().find(|(p, _)| *p == name) {
            None => return Err(invalid("no such parameter in [parameters]")),
            Some((_, value)) => {
                if !matches!(parse_param_value(value), ParamValue::Numeric { .. }) {
                    return Err(invalid("only numeric parameters can be optimized"));
                }
            }
        }
    }
    Ok(())
}
