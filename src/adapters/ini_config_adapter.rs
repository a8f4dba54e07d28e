//! INI job file adapter.
//!
//! Keys are case-sensitive and sections keep their file order: expert
//! parameter names are written to the `.set` file exactly as given.
//! Only whole-line comments are recognised, so `;` and `#` inside a value
//! are kept.

use crate::domain::config_validation::parse_flag;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct IniConfigAdapter {
    config: Ini,
}

fn job_parser() -> Ini {
    let mut config = Ini::new_cs();
    config.set_inline_comment_symbols(Some(&[]));
    config
}

impl IniConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = job_parser();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = job_parser();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for IniConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.get_string(section, key) {
            Some(raw) => raw.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(default)
    }

    fn entries(&self, section: &str) -> Vec<(String, String)> {
        let Some(keys) = self.config.get_map_ref().get(section) else {
            return Vec::new();
        };
        keys.iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
            .collect()
    }
}
